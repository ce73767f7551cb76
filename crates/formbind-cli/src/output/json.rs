use formbind_core::error::FormBindError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), FormBindError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
