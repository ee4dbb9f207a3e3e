use fake::faker::address::en::CityName;
use fake::faker::company::en::CompanyName;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::Rng;

use crate::db::entity::Customer;

/// Company customers with made-up identities. Ids start at 1.
pub fn fake_customers<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Customer> {
    (1..=count as i64)
        .map(|id| {
            let name: String = CompanyName().fake_with_rng(rng);
            let email = format!("contact{id}@{}.example.com", slug(&name));
            Customer {
                id,
                name,
                email: Some(email),
                phone: Some(PhoneNumber().fake_with_rng(rng)),
                city: Some(CityName().fake_with_rng(rng)),
                is_company: true,
            }
        })
        .collect()
}

fn slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        }
        else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
