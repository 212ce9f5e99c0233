//! Host functions available to every program as globals.

use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::callable::{Callable, NativeFunction};
use crate::environment::Environment;
use crate::value::Value;

/// Define every native function in `globals`.
pub fn install<'a>(globals: &mut Environment<'a>) {
    let natives: [NativeFunction<'a>; 1] = [NativeFunction::new("clock", 0, clock)];

    for native in natives {
        debug!("Installing native function '{}'", native.name);
        globals.define(native.name, Value::Callable(Callable::Native(Rc::new(native))));
    }
}

/// Seconds since the Unix epoch, with millisecond precision.
fn clock<'a>(_args: &[Value<'a>]) -> Result<Value<'a>, String> {
    let millis = Utc::now().timestamp_millis();
    Ok(Value::Number(millis as f64 / 1000.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_a_zero_arity_global() {
        let mut globals = Environment::new();
        install(&mut globals);

        let Ok(Value::Callable(clock)) = globals.get("clock") else {
            panic!("clock should be defined");
        };
        assert_eq!(clock.arity(), 0);
        assert_eq!(clock.to_string(), "<native fn clock>");
    }

    #[test]
    fn clock_reports_seconds() {
        let Ok(Value::Number(seconds)) = clock(&[]) else {
            panic!("clock should return a number");
        };
        // Well after 2020-01-01.
        assert!(seconds > 1_577_836_800.0);
    }
}
