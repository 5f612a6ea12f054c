use accounts_adapters::AccountsSetting;
use accounts_application::Registration;
use accounts_core::UserProfile;
use accounts_service::InMemoryAccountService;
use fake::{
    Fake,
    faker::{internet::en::SafeEmail, name::en::Name},
};
use secrecy::Secret;

pub const PASSWORD: &str = "correct-horse-battery";

const TEST_SETTINGS: &str = r#"{
    "auth": {
        "access_token": { "secret": "test-access-secret", "time_to_live": 60 },
        "refresh_token": { "secret": "test-refresh-secret", "time_to_live": 3600 },
        "verification_token": { "time_to_live": 600 }
    },
    "password_hash": { "memory_cost_kib": 1024, "iterations": 1, "parallelism": 1 }
}"#;

pub struct TestApp {
    pub service: InMemoryAccountService,
}

impl TestApp {
    pub fn new() -> Self {
        let settings = AccountsSetting::from_json(TEST_SETTINGS).expect("Invalid test settings");
        let service =
            InMemoryAccountService::in_memory(&settings).expect("Failed to build account service");
        Self { service }
    }

    /// Registers an account with a random name and email and a fixed password.
    pub async fn register(&self, phone: &str) -> (String, UserProfile) {
        let email: String = SafeEmail().fake();
        let profile = self
            .service
            .register(
                registration(&email, phone),
                secret(PASSWORD),
                secret(PASSWORD),
            )
            .await
            .expect("Failed to register test user");
        (email.to_lowercase(), profile)
    }

    /// Pulls the single-use token out of the last email sent to `email`.
    pub async fn last_token_sent_to(&self, email: &str) -> Secret<String> {
        let message = self
            .service
            .email_client()
            .last_sent_to(email)
            .await
            .expect("No email was sent");
        let token = message
            .content
            .lines()
            .map(str::trim)
            .find(|line| line.len() == 64 && line.chars().all(|c| c.is_ascii_hexdigit()))
            .expect("Email carries no token");
        secret(token)
    }
}

pub fn registration(email: &str, phone: &str) -> Registration {
    let name: String = Name().fake();
    Registration {
        name: name.chars().take(50).collect(),
        email: secret(email),
        phone: phone.to_string(),
        photo: None,
        shipping_address: None,
        billing_address: None,
    }
}

pub fn secret(value: &str) -> Secret<String> {
    Secret::new(value.to_string())
}
