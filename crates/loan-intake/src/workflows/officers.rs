//! Staff directory backing the "choose your loan officer" page.

use serde::{Deserialize, Serialize};

use super::application::domain::{OfficerId, SelectedOfficer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanOfficer {
    pub id: OfficerId,
    pub name: String,
    pub title: String,
    pub image_url: String,
    pub bio: String,
}

impl LoanOfficer {
    pub fn selection(&self) -> SelectedOfficer {
        SelectedOfficer {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficerDirectory {
    officers: Vec<LoanOfficer>,
}

impl OfficerDirectory {
    pub fn new(officers: Vec<LoanOfficer>) -> Self {
        Self { officers }
    }

    /// The brokerage's published roster.
    pub fn standard() -> Self {
        let officer = |id: u32, name: &str, title: &str, image: &str, bio: &str| LoanOfficer {
            id: OfficerId(id),
            name: name.to_string(),
            title: title.to_string(),
            image_url: format!("assets/loan-officers/{image}"),
            bio: bio.to_string(),
        };

        Self::new(vec![
            officer(
                1,
                "Michael DeMie",
                "Mortgage Broker",
                "michael_d.jpg",
                "Michael has over 25 years of experience in the mortgage industry and guides \
                 clients through purchases and refinances of every size.",
            ),
            officer(
                2,
                "Emilee Smith",
                "Loan Officer",
                "emilee_s.png",
                "Emilee brings 6 years of expertise to the table. Her attention to detail and \
                 commitment to client satisfaction have earned her consistent 5-star reviews.",
            ),
            officer(
                3,
                "José Mendoza",
                "Loan Officer",
                "jose_m.jpeg",
                "José recently joined the team and focuses on first-time home buyers.",
            ),
        ])
    }

    pub fn all(&self) -> &[LoanOfficer] {
        &self.officers
    }

    pub fn find(&self, id: OfficerId) -> Option<&LoanOfficer> {
        self.officers.iter().find(|officer| officer.id == id)
    }
}

impl Default for OfficerDirectory {
    fn default() -> Self {
        Self::standard()
    }
}
