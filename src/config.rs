use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_origin: String,
    pub stripe_secret_key: String,
    pub mailtrap_api_token: String,
    pub mailtrap_sender_email: String,
    pub cloudinary_cloud_name: String,
    pub cloudinary_upload_preset: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());
        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| frontend_url.clone());
        let stripe_secret_key = env::var("STRIPE_SECRET_KEY")?;
        let mailtrap_api_token = env::var("MAILTRAP_API_TOKEN")?;
        let mailtrap_sender_email = env::var("MAILTRAP_SENDER_EMAIL")
            .unwrap_or_else(|_| "no-reply@cdyeats.example".to_string());
        let cloudinary_cloud_name = env::var("CLOUDINARY_CLOUD_NAME")?;
        let cloudinary_upload_preset =
            env::var("CLOUDINARY_UPLOAD_PRESET").unwrap_or_else(|_| "unsigned".to_string());
        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            cors_origin,
            stripe_secret_key,
            mailtrap_api_token,
            mailtrap_sender_email,
            cloudinary_cloud_name,
            cloudinary_upload_preset,
        })
    }
}
