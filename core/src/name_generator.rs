//! Deterministic names for demo drivers, customers, hubs and routes.
//!
//! Same RNG stream, same names. Phone numbers and registrations are
//! shaped like Indian ones but are not real.

use crate::rng::DemoRng;

pub struct NameGenerator;

impl NameGenerator {
    pub fn full_name(rng: &mut DemoRng) -> String {
        let first = Self::pick(rng, Self::first_names());
        let last = Self::pick(rng, Self::last_names());
        format!("{first} {last}")
    }

    /// Ten-digit mobile number starting 6-9.
    pub fn phone(rng: &mut DemoRng) -> String {
        let lead = rng.between(6, 9);
        let rest = rng.below(1_000_000_000);
        format!("{lead}{rest:09}")
    }

    /// Registration like `KA 01 AB 1234`.
    pub fn registration(rng: &mut DemoRng) -> String {
        let state = Self::pick(rng, Self::state_codes());
        let district = rng.between(1, 60);
        let a = (b'A' + rng.below(26) as u8) as char;
        let b = (b'A' + rng.below(26) as u8) as char;
        let number = rng.between(1, 9999);
        format!("{state} {district:02} {a}{b} {number:04}")
    }

    pub fn hub_names() -> &'static [&'static str] {
        &["Koramangala", "Whitefield", "Hebbal", "Electronic City", "Jayanagar"]
    }

    pub fn locality(rng: &mut DemoRng) -> &'static str {
        Self::pick(rng, Self::localities())
    }

    fn pick(rng: &mut DemoRng, items: &'static [&'static str]) -> &'static str {
        rng.pick(items).copied().unwrap_or("Unknown")
    }

    fn first_names() -> &'static [&'static str] {
        &[
            // Male names
            "Aarav", "Vihaan", "Arjun", "Sai", "Reyansh", "Ayaan", "Krishna", "Ishaan",
            "Rohan", "Karthik", "Manoj", "Suresh", "Ramesh", "Vijay", "Anil", "Prakash",
            "Naveen", "Harish", "Imran", "Faisal", "Gurpreet", "Harpreet", "Joseph", "Thomas",
            "Venkat", "Srinivas", "Rajesh", "Mahesh", "Deepak", "Sandeep",
            // Female names
            "Aadhya", "Ananya", "Diya", "Saanvi", "Priya", "Kavya", "Meera", "Lakshmi",
            "Divya", "Pooja", "Sneha", "Nandini", "Ayesha", "Fatima", "Simran", "Mary",
            "Shruti", "Swathi", "Keerthi", "Bhavana",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Sharma", "Verma", "Iyer", "Nair", "Reddy", "Rao", "Gowda", "Shetty",
            "Kumar", "Singh", "Patel", "Mehta", "Khan", "Sheikh", "Das", "Banerjee",
            "Mukherjee", "Pillai", "Menon", "Naidu", "Hegde", "Kulkarni", "Joshi", "Desai",
            "Fernandes", "D'Souza", "Gill", "Sandhu", "Chatterjee", "Bhat",
        ]
    }

    fn state_codes() -> &'static [&'static str] {
        &["KA", "KA", "KA", "TN", "MH", "AP", "TS", "KL"]
    }

    fn localities() -> &'static [&'static str] {
        &[
            "Kempegowda Airport", "MG Road", "Indiranagar", "HSR Layout", "BTM Layout",
            "Marathahalli", "Yelahanka", "Bellandur", "Malleshwaram", "Rajajinagar",
            "JP Nagar", "Banashankari", "Bannerghatta Road", "Sarjapur Road", "Manyata Tech Park",
            "Majestic", "Yeshwanthpur", "KR Puram", "Domlur", "Ulsoor",
        ]
    }
}
