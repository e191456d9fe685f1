use crewmatch_core::error::CrewError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), CrewError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
