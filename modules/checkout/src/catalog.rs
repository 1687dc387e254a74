use rust_decimal::Decimal;

use crate::models::Offer;

/// Course packages sold on the landing page.
#[derive(Debug, Clone)]
pub struct Catalog {
    offers: Vec<Offer>,
}

impl Catalog {
    pub fn new(offers: Vec<Offer>) -> Self {
        Self { offers }
    }

    pub fn find(&self, id: &str) -> Option<&Offer> {
        self.offers.iter().find(|offer| offer.id == id)
    }

    pub fn offers(&self) -> &[Offer] {
        &self.offers
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(vec![
            Offer {
                id: "tajne-tehnike",
                title: "Tajne Tehnike Prodaje",
                price: Decimal::new(1497, 2),
                description: "Osnove prodaje i komunikacije sa kreatorima",
                features: vec![
                    "Osnovne tehnike prodaje",
                    "Komunikacijske strategije",
                    "Praktični primeri",
                    "Live podrška",
                ],
            },
            Offer {
                id: "live-mentorship",
                title: "Live Mentorštip",
                price: Decimal::new(3497, 2),
                description: "Direktno mentorstvo i personalizovana pomoć",
                features: vec![
                    "Sve iz osnovnog kursa",
                    "Live sesije mentorstva",
                    "Personalizovane strategije",
                    "Direktan pristup mentoru",
                    "Grupa za podršku",
                ],
            },
            Offer {
                id: "zagarantovan-posao",
                title: "Zagarantovan Posao",
                price: Decimal::new(9997, 2),
                description: "Kompletna podrška do prvog posla",
                features: vec![
                    "Sve iz prethodnih paketa",
                    "Garantovan posao",
                    "Individualno praćenje",
                    "Pomoć pri pronalaženju klijenata",
                    "Doživotna podrška",
                    "Bonus materijali",
                ],
            },
        ])
    }
}
