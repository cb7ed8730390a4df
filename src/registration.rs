//! Free-text registration parsing.
//!
//! The dispatch core only accepts typed records; this module turns
//! operator-entered strings into them. A parse failure never reaches the
//! core, so a partially-constructed rider or driver cannot exist.

use anyhow::{bail, Context, Result};
use ridehail_core::profile::{PersonProfile, VehicleProfile};

/// Parse `"Name, Gender, Age"` person details.
pub fn parse_person(details: &str) -> Result<(String, PersonProfile)> {
    let fields: Vec<&str> = details.split(',').map(str::trim).collect();
    let &[name, gender, age] = fields.as_slice() else {
        bail!("malformed person details (expected \"Name, Gender, Age\"): {details:?}");
    };
    if name.is_empty() || gender.is_empty() {
        bail!("malformed person details (empty field): {details:?}");
    }
    let age: u32 = age
        .parse()
        .with_context(|| format!("invalid age in person details {details:?}"))?;

    Ok((
        name.to_string(),
        PersonProfile {
            gender: gender.to_string(),
            age,
        },
    ))
}

/// Parse `"Model, PlateNumber"` vehicle details.
pub fn parse_vehicle(details: &str) -> Result<VehicleProfile> {
    let fields: Vec<&str> = details.split(',').map(str::trim).collect();
    let &[model, plate_number] = fields.as_slice() else {
        bail!("malformed vehicle details (expected \"Model, PlateNumber\"): {details:?}");
    };
    if model.is_empty() || plate_number.is_empty() {
        bail!("malformed vehicle details (empty field): {details:?}");
    }

    Ok(VehicleProfile {
        model: model.to_string(),
        plate_number: plate_number.to_string(),
    })
}
