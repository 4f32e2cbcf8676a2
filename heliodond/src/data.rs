//! The static content of the scene: the places that appear as markers
//! on the globe, with the career entry attached to each one. Adding a
//! place means adding a record here; nothing else in the daemon needs
//! to change.

/// One marked place on the globe.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    /// Latitude and longitude, in degrees.
    pub coordinates: (f64, f64),
    pub role: &'static str,
    pub company: &'static str,
    pub period: &'static str,
    pub description: &'static str,
    pub skills: &'static [&'static str],
}

pub const LOCATIONS: &[Location] = &[
    Location {
        id: "boston",
        name: "Boston, MA",
        coordinates: (42.3601, -71.0589),
        role: "Computer Science Student",
        company: "Northeastern University",
        period: "2021 - Present",
        description:
            "Pursuing BS in Computer Science with focus on software engineering",
        skills: &["React", "TypeScript", "Node.js"],
    },
    Location {
        id: "germany",
        name: "Munich, Germany",
        coordinates: (48.1351, 11.5820),
        role: "Software Development Engineer Intern",
        company: "Fleischhacker Medizintechnik",
        period: "Jan 2024 - May 2024",
        description:
            "Led RFID warehouse system transition, increased output by 18%",
        skills: &["Java", ".NET", "Android", "RFID"],
    },
    Location {
        id: "vietnam",
        name: "Hanoi, Vietnam",
        coordinates: (21.0285, 105.8542),
        role: "Cyber-Security Intern",
        company: "Vietcombank",
        period: "May 2023 - Jul 2023",
        description:
            "Penetration testing and security analysis for banking systems",
        skills: &["Burp Suite", "Security", "Malware Analysis"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records() {
        assert_eq!(LOCATIONS.len(), 3);
        assert_eq!(LOCATIONS[0].id, "boston");
        assert_eq!(LOCATIONS[0].company, "Northeastern University");
        assert_eq!(
            LOCATIONS[2].coordinates,
            (21.0285, 105.8542)
        );

        // Ids are unique; markers and arcs key off them.

        for (ii, loc) in LOCATIONS.iter().enumerate() {
            assert!(LOCATIONS
                .iter()
                .skip(ii + 1)
                .all(|other| other.id != loc.id));
        }
    }

    #[test]
    fn test_coordinates_in_range() {
        for loc in LOCATIONS {
            let (lat, lng) = loc.coordinates;

            assert!((-90.0..=90.0).contains(&lat), "{}", loc.id);
            assert!((-180.0..=180.0).contains(&lng), "{}", loc.id);
            assert!(!loc.skills.is_empty(), "{}", loc.id);
        }
    }
}
