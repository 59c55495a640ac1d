//! Demo accounts and a sample menu

use pizzahub_core::{Category, Price, Role, Size, SizePrices};

use crate::crypto::hash_password;
use crate::error::ApiError;
use crate::store::{CatalogStore, NewPizza, NewUser, UserStore};

pub const ADMIN_EMAIL: &str = "admin@pizzahub.com";
pub const ADMIN_PASSWORD: &str = "adminpass";
pub const DEMO_USER_EMAIL: &str = "user@pizzahub.com";
pub const DEMO_USER_PASSWORD: &str = "userpass123";

struct SamplePizza {
    name: &'static str,
    description: &'static str,
    prices: [i64; 3],
    category: Category,
    popular: bool,
}

const SAMPLE_MENU: &[SamplePizza] = &[
    SamplePizza {
        name: "Margherita",
        description: "Classic pizza with tomato sauce, mozzarella, and basil",
        prices: [199, 299, 399],
        category: Category::Veg,
        popular: true,
    },
    SamplePizza {
        name: "Pepperoni",
        description: "Spicy pepperoni with mozzarella and tomato sauce",
        prices: [249, 349, 449],
        category: Category::NonVeg,
        popular: true,
    },
    SamplePizza {
        name: "Veggie Delight",
        description: "Loaded with fresh vegetables and cheese",
        prices: [229, 329, 429],
        category: Category::Veg,
        popular: false,
    },
];

/// What a seeding run created
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub pizzas: usize,
}

fn seed_user<U: UserStore>(
    users: &U,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
    phone: Option<&str>,
) -> Result<bool, ApiError> {
    if users.get_user_by_email(email)?.is_some() {
        return Ok(false);
    }

    let password_hash =
        hash_password(password).map_err(|e| ApiError::Storage(e.to_string()))?;

    users.create_user(NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password_hash,
        phone: phone.map(str::to_string),
        role,
        verified: true,
    })?;

    tracing::info!(email = %email, role = %role, "Seeded account");
    Ok(true)
}

/// Create the demo accounts and menu. Existing emails and pizza names are
/// left alone, so running it twice is harmless.
pub fn seed_demo_data<U, C>(users: &U, catalog: &C) -> Result<SeedReport, ApiError>
where
    U: UserStore,
    C: CatalogStore,
{
    let mut report = SeedReport::default();

    if seed_user(users, "Admin", ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin, None)? {
        report.users += 1;
    }
    if seed_user(
        users,
        "John Doe",
        DEMO_USER_EMAIL,
        DEMO_USER_PASSWORD,
        Role::User,
        Some("+1234567890"),
    )? {
        report.users += 1;
    }

    let existing: Vec<String> = catalog
        .list_pizzas(false)?
        .into_iter()
        .map(|p| p.name)
        .collect();

    for sample in SAMPLE_MENU {
        if existing.iter().any(|name| name == sample.name) {
            continue;
        }

        let sizes: SizePrices = Size::ALL
            .into_iter()
            .zip(sample.prices)
            .map(|(size, price)| (size, Price(price)))
            .collect();

        catalog.create_pizza(NewPizza {
            name: sample.name.to_string(),
            description: sample.description.to_string(),
            image: None,
            base_price: Price(sample.prices[1]),
            sizes,
            toppings: Vec::new(),
            category: sample.category,
            popular: sample.popular,
            available: true,
        })?;
        report.pizzas += 1;
    }

    tracing::info!(users = report.users, pizzas = report.pizzas, "Demo data seeded");
    Ok(report)
}
