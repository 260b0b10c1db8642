//! Manufacturer catalog.

use serde::{Deserialize, Serialize};

/// A disc manufacturer offered when adding discs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manufacturer {
    /// Short stable key.
    pub id: String,
    /// Display name.
    pub name: String,
}

impl Manufacturer {
    /// Create a catalog entry.
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

const CATALOG: &[(&str, &str)] = &[
    ("1080", "1080 Disc Golf"),
    ("3disc", "3 Disc Golf"),
    ("abc", "ABC Discs"),
    ("agl", "AGL Discs"),
    ("aerobie", "Aerobie"),
    ("alfadiscs", "Alfa Discs"),
    ("aquaflight", "AquaFlight"),
    ("arsenal", "Arsenal Discworks"),
    ("axiom", "Axiom"),
    ("birdie", "Birdie Disc Golf Supply"),
    ("blackzombie", "Black Zombie"),
    ("ching", "Ching"),
    ("clash", "Clash Discs"),
    ("crosslap", "Crosslap"),
    ("daredevil", "Daredevil Discs"),
    ("dga", "DGA"),
    ("discmania", "Discmania"),
    ("discraft", "Discraft"),
    ("disctroyer", "Disctroyer"),
    ("discwing", "Discwing"),
    ("divergent", "Divergent Discs"),
    ("dynamic", "Dynamic Discs"),
    ("elevation", "Elevation Disc Golf"),
    ("ev7", "EV-7"),
    ("finishline", "Finish Line"),
    ("fullturn", "Full Turn Discs"),
    ("gateway", "Gateway"),
    ("galaxy", "Galaxy Disc Golf"),
    ("goliath", "Goliath Discs"),
    ("guru", "Guru Disc Golf"),
    ("hooligan", "Hooligan Discs"),
    ("hyzerbomb", "HyzerBomb"),
    ("infinite", "Infinite Discs"),
    ("innova", "Innova"),
    ("kastaplast", "Kastaplast"),
    ("launch", "Launch Disc Golf"),
    ("legacy", "Legacy Discs"),
    ("latitude64", "Latitude 64"),
    ("lightning", "Lightning Discs"),
    ("loft", "Loft Discs"),
    ("lonestar", "Lone Star Disc"),
    ("millennium", "Millennium"),
    ("mint", "Mint Discs"),
    ("mvp", "MVP"),
    ("obdiscs", "Obsidian Discs"),
    ("ozone", "Ozone Disc Golf"),
    ("prodigy", "Prodigy"),
    ("prodiscus", "Prodiscus"),
    ("reptilian", "Reptilian Disc Golf"),
    ("remix", "Remix Disc Golf"),
    ("rpm", "RPM Discs"),
    ("skyquest", "Skyquest"),
    ("storm", "Storm Disc Golf"),
    ("streamline", "Streamline"),
    ("sune", "Sune Sport"),
    ("terminalvelocity", "Terminal Velocity"),
    ("tsa", "Thought Space Athletics"),
    ("trashpanda", "Trash Panda"),
    ("ub", "UB Disc Golf"),
    ("vibram", "Vibram"),
    ("viking", "Viking Discs"),
    ("westside", "Westside Discs"),
    ("wild", "Wild Discs"),
    ("wingit", "Wing It Disc Golf"),
    ("xcom", "X-Com"),
    ("yikun", "Yikun"),
    ("zing", "Zing"),
];

/// The built-in manufacturer list used to seed a new document.
#[must_use]
pub fn default_catalog() -> Vec<Manufacturer> {
    CATALOG
        .iter()
        .map(|(id, name)| Manufacturer::new(id, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_are_unique() {
        let catalog = default_catalog();
        let ids: HashSet<_> = catalog.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.iter().any(|m| m.name == "Innova"));
    }
}
