//! Built-in seed rows.

use std::{fmt, str::FromStr};

use crate::{errors::DirectoryError, record::DirectoryRecord};

/// Which built-in row set to write into a fresh table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SeedSet {
    /// Five city-level clinics across common specialties.
    #[default]
    Clinics,
    /// Six Bangalore-locality specialists (orthopedics, nutrition, sports medicine).
    Localities,
}

type Row = (&'static str, &'static str, &'static str, &'static str, &'static str);

const CLINICS: &[Row] = &[
    ("Dr. Priya Sharma", "General Physician", "Apollo Clinic", "Bangalore", "080-12345678"),
    ("Dr. Rajan Mehta", "Cardiologist", "Fortis Hospital", "Bangalore", "080-87654321"),
    ("Dr. Anita Rao", "Neurologist", "Manipal Hospital", "Bangalore", "080-11223344"),
    ("Dr. Suresh Kumar", "Dermatologist", "Columbia Asia", "Bangalore", "080-55667788"),
    ("Dr. Meena Iyer", "Nutritionist", "Narayana Health", "Bangalore", "080-99887766"),
];

const LOCALITIES: &[Row] = &[
    ("Dr. Ramesh Kumar", "Orthopedics", "HOSMAT Hospital", "Ashok Nagar", "080-12345670"),
    ("Dr. Sneha Reddy", "Dietetics & Nutrition", "Sakra World Hospital", "Bellandur", "080-12345671"),
    ("Dr. Anil Sharma", "General Medicine", "Aster CMI Hospital", "Hebbal", "080-12345672"),
    ("Dr. Priya Desai", "Orthopedics", "Manipal Hospital", "Old Airport Road", "080-12345673"),
    ("Dr. Vikram Singh", "Sports Medicine", "Fortis Hospital", "Bannerghatta Road", "080-12345674"),
    ("Dr. Kavita Menon", "Clinical Nutrition", "Vasavi Hospitals", "Kumaraswamy Layout", "080-12345675"),
];

/// Every seed row is in Bangalore.
const SEED_CITY: &str = "Bangalore";

impl SeedSet {
    pub fn records(self) -> Vec<DirectoryRecord> {
        let rows = match self {
            SeedSet::Clinics => CLINICS,
            SeedSet::Localities => LOCALITIES,
        };
        rows.iter()
            .map(|&(name, specialty, facility, locality, contact)| {
                DirectoryRecord::new(name, specialty, facility, locality, Some(SEED_CITY), contact)
            })
            .collect()
    }
}

impl FromStr for SeedSet {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clinics" => Ok(SeedSet::Clinics),
            "localities" => Ok(SeedSet::Localities),
            other => Err(DirectoryError::Config(format!(
                "unknown seed set `{other}` (expected `clinics` or `localities`)"
            ))),
        }
    }
}

impl fmt::Display for SeedSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeedSet::Clinics => "clinics",
            SeedSet::Localities => "localities",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_sets_are_valid_and_sized() {
        let clinics = SeedSet::Clinics.records();
        let localities = SeedSet::Localities.records();
        assert_eq!(clinics.len(), 5);
        assert_eq!(localities.len(), 6);
        for (i, r) in clinics.iter().chain(localities.iter()).enumerate() {
            r.validate(i).unwrap();
        }
        assert_eq!(clinics[1].specialty, "Cardiologist");
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Localities".parse::<SeedSet>().unwrap(), SeedSet::Localities);
        assert!("hospitals".parse::<SeedSet>().is_err());
        assert_eq!(SeedSet::Clinics.to_string(), "clinics");
    }
}
