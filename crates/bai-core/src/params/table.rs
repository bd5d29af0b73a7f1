//! Built-in BA-Intellidrive parameter table
//!
//! Ranges and defaults follow the drive manual except where noted.

use super::{ParameterSpec, INT_MAX, INT_MIN};

/// Baud rates selectable through `PRM:90`
pub(crate) static BAUD_RATES: [u32; 6] = [1200, 2400, 4800, 9600, 19200, 38400];

/// Software limit bounds measured on hardware. The manual lists the full
/// integer range, which the drive does not accept.
const SOFTWARE_LIMIT: i64 = 2_147_483_600;

pub(crate) fn standard_parameters() -> Vec<ParameterSpec> {
    use ParameterSpec as P;

    vec![
        // Servo loop gains
        P::int(0, "KP", 0, INT_MAX, 750_000)
            .doc("Proportional gain applied to the velocity error of the PID loop."),
        P::int(1, "KI", 0, INT_MAX, 35_000)
            .doc("Integral gain applied to the velocity error of the PID loop."),
        P::int(2, "KPOS", 0, INT_MAX, 15_000)
            .doc("Proportional gain applied to the position error of the PID loop."),
        P::int(3, "KP increment", 0, 100_000, 1000).doc("Step size when adjusting KP."),
        P::int(4, "KI increment", 0, 100_000, 100).doc("Step size when adjusting KI."),
        P::int(5, "KPOS increment", 0, 100_000, 10).doc("Step size when adjusting KPOS."),
        P::int(6, "servo tolerance", 1, 1000, 2)
            .units("counts")
            .doc("Position error still reported as \"in position\"."),
        // Current and fault limits
        P::int(7, "peak current limit", 0, 100, 100)
            .units("%")
            .doc("Maximum current the loop may command before faulting. Takes effect after reset."),
        P::int(8, "RMS current limit", 0, 100, 20)
            .units("%")
            .doc("RMS current the loop may command before faulting. Takes effect after reset."),
        P::int(9, "RMS current timeout", 0, 10, 2)
            .units("s")
            .doc("Time the current may stay above the RMS limit before faulting. Takes effect after reset."),
        P::int(10, "velocity trap", 0, 65535, 0)
            .units("counts")
            .doc("Largest absolute velocity error tolerated before faulting. Takes effect after reset."),
        P::int(11, "integral clamp", 0, 65535, 5000)
            .units("counts")
            .doc("Clamp on the integral term of the PID loop. Takes effect after reset."),
        P::int(12, "position error trap", 0, 65535, 100)
            .units("counts")
            .doc("Largest position error tolerated before faulting. Takes effect after reset."),
        P::int(13, "update rate", 1, 20, 4)
            .units("0.25s")
            .doc("Servo update time. Takes effect after reset."),
        // Motor and commutation
        P::int(14, "encoder resolution", 300, INT_MAX, 4000)
            .units("counts")
            .doc("Encoder line count times four, used for brushless commutation. Takes effect after reset."),
        P::int(15, "cycles per revolution", 1, 20, 4)
            .doc("Electrical cycles per mechanical revolution (pole pairs). Use 1 for linear motors. Takes effect after reset."),
        P::int(16, "hall effects", 0, 1, 1)
            .doc("Set to 1 when Hall sensors are available to initialise commutation. Takes effect after reset."),
        P::int(17, "initialization current", 0, 100, 20)
            .units("%")
            .doc("Peak current used while initialising a brushless motor. Takes effect after reset."),
        P::int(18, "VFF", 0, 1000, 256)
            .doc("Velocity feedforward gain, divided by 256 before being added to the loop."),
        P::int(20, "operating mode", 1, 5, 4)
            .doc("Position command source: 4 for the trajectory generator, 5 for clock and direction input."),
        P::int(22, "position save", 0, 1, 0)
            .doc("Save the commanded position to flash at the end of each move. Takes effect after reset."),
        P::int(23, "reload saved position", 0, 1, 0)
            .doc("Load the saved position into the feedback register on power up."),
        P::int(24, "saved position", 0, INT_MAX, 0).doc("Last saved commanded position."),
        P::int(26, "lowpass filter", 0, 1, 0)
            .doc("Filter the PID output, cutoff set by PRM:202. Takes effect after reset."),
        P::int(27, "phase offset", -359, 359, 0)
            .units("deg")
            .doc("Shift applied to the commutation table. Takes effect after reset."),
        P::int(29, "input command offset", -1000, 1000, 0)
            .doc("Correction for offsets in external analog circuitry."),
        // Motion defaults
        P::int(30, "default velocity", 0, INT_MAX, 50_000)
            .units("counts/s")
            .doc("Velocity used when a move does not specify one. Takes effect after reset."),
        P::int(31, "jog value", 0, INT_MAX, 1000)
            .units("counts")
            .doc("Distance moved per step in teach mode."),
        P::int(32, "in position bit", 0, 1, 0)
            .doc("Use output 3 as an in-position indicator."),
        P::int(33, "deadband wait", 0, 50_000, 0)
            .units("ms")
            .doc("Delay after a move before checking in-position. Takes effect after reset."),
        P::int(34, "thermistor polarity", 0, 1, 1).doc("Polarity of the motor thermistor input."),
        P::int(36, "position mode", 0, 1, 0)
            .doc("Positioning mode after reset: 0 incremental, 1 absolute."),
        P::int(37, "estop action", 0, 1, 0).doc("Action taken when the estop input goes low."),
        P::int(38, "phase A current offset", -2048, 2048, 0)
            .doc("Nulls a current offset on phase A."),
        P::int(39, "phase B current offset", -2048, 2048, 0)
            .doc("Nulls a current offset on phase B (brushless only)."),
        P::int(40, "registration input", 0, 1, 0)
            .doc("Use input 3 to capture position and return the motor to it."),
        P::int(41, "encoder scale factor", -1, 1, 1)
            .doc("Reverse encoder polarity without rewiring."),
        P::int(42, "IO read delay", 0, 15_000, 0)
            .units("ms")
            .doc("Debounce delay between consecutive input reads."),
        P::int(43, "trajectory type", 0, 1, 0).doc("Motion profile: 0 trapezoidal, 1 S-curve."),
        P::int(44, "encoder fault enable", 0, 1, 1)
            .doc("Fault on a missing or faulty encoder. Usually 0 for single-ended encoders."),
        P::int(45, "estop polarity", 0, 1, 0).doc("Polarity of the estop input."),
        P::int(46, "ACK after move", 0, 1, 0)
            .doc("Send 0x06 on the serial port when a move completes."),
        P::int(47, "in position polarity", 0, 1, 0).doc("Polarity of the in-position output."),
        P::int(52, "RMS method", 0, 1, 0)
            .doc("RMS current calculation: 0 average current, 1 I*I*t."),
        // Limits and homing
        P::int(60, "limit check", 0, 2, 1)
            .doc("0 no limit checks and no homing, 1 checks and homing, 2 homing only."),
        P::int(61, "limit type", 0, 1, 0)
            .doc("Hardware limit polarity: 1 active high, 0 active low. Takes effect after reset."),
        P::int(62, "home direction", 0, 1, 0)
            .doc("Initial homing direction: 0 CCW, 1 CW."),
        P::int(63, "home type", 0, 3, 1)
            .doc("Home switch: 0 CW, 1 CCW, 2 home, 3 marker. Takes effect after reset."),
        P::int(64, "home velocity", 0, INT_MAX, 10_000)
            .units("counts/s")
            .doc("Velocity while seeking the home limit."),
        P::int(65, "home ending offset", 0, INT_MAX, 0)
            .units("counts")
            .doc("Distance moved after the home marker; its end defines home."),
        P::int(66, "home marker velocity", 0, INT_MAX, 500)
            .units("counts")
            .doc("Velocity while searching for the marker pulse."),
        P::int(67, "negative software limit", -SOFTWARE_LIMIT, SOFTWARE_LIMIT, -SOFTWARE_LIMIT)
            .units("counts")
            .doc("Negative software limit threshold."),
        P::int(68, "positive software limit", -SOFTWARE_LIMIT, SOFTWARE_LIMIT, SOFTWARE_LIMIT)
            .units("counts")
            .doc("Positive software limit threshold."),
        P::int(69, "deceleration distance", 1, INT_MAX, 4000)
            .units("counts")
            .doc("Stopping distance after an abort or on entering a limit."),
        P::int(70, "limit reset distance", 0, INT_MAX, 4000)
            .units("counts")
            .doc("Distance moved on fault acknowledge while in a limit."),
        P::int(71, "check move", 0, 1, 0)
            .doc("Reject index moves that would enter a software limit."),
        P::int(72, "marker type", 0, 3, 3)
            .doc("Marker used while homing: 0 CW, 1 CCW, 2 home limit, 3 marker."),
        P::int(73, "offset to marker", INT_MIN, INT_MAX, 0)
            .units("counts")
            .doc("Distance moved after the home limit before searching for the marker."),
        P::int(74, "program execution", 0, 1, 0)
            .doc("On a limit: 0 stop motion and program, 1 stop motion only."),
        P::int(75, "home velocity out", 0, INT_MAX, 10_000)
            .units("counts/s")
            .doc("Velocity when leaving the home limit before the marker search."),
        P::int(76, "marker polarity", 0, 1, 1).doc("Marker polarity: 0 active low, 1 active high."),
        P::int(77, "output disable", 0, 1, 0).doc("Turn off all outputs on a fault."),
        // Communication
        P::int(90, "baud rate", 1200, 38400, 9600)
            .allowed(&BAUD_RATES)
            .units("bps")
            .doc("Serial baud rate."),
        P::char(91, "SRQ", ' ', '\x7f', '%')
            .doc("Service request character used in remote mode."),
        P::int(92, "displayable digits", 1, 8, 4)
            .doc("Digits printed after the decimal point in local mode."),
        P::char(94, "unit address", '0', 'Z', 'A')
            .doc("Address of this unit. Each unit in a daisy chain needs a unique address."),
        P::int(95, "daisy chain", 0, 1, 0)
            .doc("Enable daisy chain operation. When disabled the drive runs in local mode."),
        P::int(96, "autorun program", 0, 1, 0)
            .doc("Run the program named in PRM:97 after reset."),
        P::string(97, "boot program", Some(12), ".")
            .doc("Name of the program run at boot when autorun is enabled."),
        P::int(98, "amplifier powerup", 0, 1, 1)
            .doc("Amplifier state after reset or power cycle: 0 disabled, 1 enabled."),
        P::int(99, "external enable polarity", 0, 1, 0)
            .doc("Logic level of the external power stage enable."),
        P::int(100, "display type", 0, 1, 0)
            .doc("Number format for parameter and register reads: 0 decimal, 1 hex."),
        P::int(101, "fault output", 0, 1, 0)
            .doc("Use output 2 as a general fault indicator."),
        P::int(102, "fault polarity", 0, 1, 0).doc("Polarity of the fault output."),
        // Scaling and autotune
        P::float(200, "position scale factor", -5.0e10, 5.0e10, 1.0)
            .doc("Conversion from encoder counts to user units."),
        P::float(201, "default ramp time", 0.00025, 2.0, 0.1)
            .doc("Acceleration ramp time used when a move does not specify one."),
        P::float(202, "filter cutoff", 0.0, 20_000.0, 500.0)
            .units("Hz")
            .doc("Cutoff frequency of the output lowpass filter."),
        P::float(204, "autotune distance", 100.0, 1_000_000.0, 32_000.0)
            .units("counts")
            .doc("Distance moved while autotuning."),
        P::float(205, "autotune bandwidth", 1.0, 100.0, 20.0)
            .units("Hz")
            .doc("Velocity loop bandwidth targeted by autotuning."),
        P::float(206, "autotune damping", 0.01, 100.0, 1.0)
            .doc("Velocity loop damping factor targeted by autotuning."),
        P::float(207, "autotune start frequency", 0.001, 1000.0, 1.0)
            .units("Hz")
            .doc("Starting frequency for autotuning."),
        P::float(208, "autotune sample time", 1.0, 1000.0, 20.0)
            .units("ms")
            .doc("Sampling interval used by autotuning."),
        P::float(209, "clkdir multiplier", 0.001, 1000.0, 1.0)
            .doc("Scaling of clock pulses in clock and direction mode."),
        P::float(210, "acceleration", 0.0, 510_000_000.0, 0.0)
            .units("user units/s**2")
            .doc("Acceleration in user units. Zero means derive it from the ramp time."),
    ]
}
