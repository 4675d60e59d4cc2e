use argot_core::{Arguments, Function, Signature, Value};

/// Function whose result lists every positional value followed by the
/// keyword entries as `key=value`.
#[must_use]
pub fn reporter(name: &str, signature: Signature) -> Function {
    Function::builder(name, signature, |args: Arguments| {
        let mut lines: Vec<Value> = args.positional().to_vec();
        lines.extend(
            args.keywords()
                .iter()
                .map(|(key, value)| Value::from(format!("{key}={value}"))),
        );
        Ok(Value::List(lines))
    })
    .build()
}

/// Function returning `value` whatever it receives.
#[must_use]
pub fn constant(value: Value) -> Function {
    Function::builder("constant", Signature::default(), move |_| Ok(value.clone())).build()
}
