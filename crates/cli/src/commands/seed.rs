//! Seed the dashboard database.
//!
//! `seed products` imports from the demo API exactly like the dashboard's
//! "Populate" button. `seed users` reads a YAML list shaped like the
//! `/api/users` request body:
//!
//! ```yaml
//! - firstName: Emily
//!   lastName: Johnson
//!   age: 28
//!   gender: female
//!   email: emily.johnson@x.dummyjson.com
//!   phone: "+81 965-431-3024"
//!   dateOfBirth: 1996-05-30
//! ```

use std::path::Path;

use tracing::{error, info, warn};

use backoffice_admin::config::{ConfigError, DemoApiConfig};
use backoffice_admin::db::{ProductRepository, RepositoryError, UserRepository};
use backoffice_admin::models::{UserDraft, UserForm};
use backoffice_admin::services::DemoApiClient;
use backoffice_admin::services::demo_api::{DEMO_PRODUCTS_LIMIT, DemoApiError};

use super::{ConnectError, connect};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Demo API error: {0}")]
    DemoApi(#[from] DemoApiError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid user entries")]
    Invalid(usize),
}

/// Import products from the demo API.
pub async fn products(limit: Option<u32>) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();
    let client = DemoApiClient::new(&DemoApiConfig::from_env()?)?;
    let pool = connect().await?;

    let limit = limit.unwrap_or(DEMO_PRODUCTS_LIMIT);
    info!(limit, "Fetching demo products");
    let remote = client.fetch_products(limit).await?;

    let batch: Vec<_> = remote.iter().filter_map(|p| p.to_external()).collect();
    let skipped = remote.len() - batch.len();
    if skipped > 0 {
        warn!(skipped, "Skipped products with out-of-range values");
    }

    let inserted = ProductRepository::new(&pool).upsert_external(&batch).await?;
    info!("Seeding complete!");
    info!("  Products fetched: {}", remote.len());
    info!("  Products inserted: {inserted}");
    Ok(())
}

/// Parse and validate a YAML list of users.
///
/// Every entry must validate; otherwise each failure is logged with its
/// position and nothing is returned.
fn parse_users(content: &str) -> Result<Vec<UserDraft>, SeedError> {
    let forms: Vec<UserForm> = serde_yaml::from_str(content)?;

    let mut drafts = Vec::with_capacity(forms.len());
    let mut invalid = 0;
    for (index, form) in forms.iter().enumerate() {
        match form.validate() {
            Ok(draft) => drafts.push(draft),
            Err(errors) => {
                invalid += 1;
                for (field, message) in errors.iter() {
                    error!("  - entry {}: {field}: {message}", index + 1);
                }
            }
        }
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(drafts)
}

/// Insert directory users from a YAML file.
pub async fn users(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading users from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: file_path.to_owned(),
            source,
        })?;
    let drafts = parse_users(&content)?;
    info!(users = drafts.len(), "Parsed users");

    let pool = connect().await?;
    let repo = UserRepository::new(&pool);

    let mut inserted = 0_usize;
    let mut skipped = 0_usize;
    for draft in &drafts {
        match repo.create(draft).await {
            Ok(_) => inserted += 1,
            Err(RepositoryError::Conflict(message)) => {
                warn!(email = %draft.email, %message, "User already exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Users inserted: {inserted}");
    info!("  Users skipped (already exist): {skipped}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    const VALID: &str = r#"
- firstName: Emily
  lastName: Johnson
  age: 28
  gender: female
  email: Emily.Johnson@x.dummyjson.com
  phone: "+81 965-431-3024"
  dateOfBirth: "1996-05-30"
- firstName: Michael
  lastName: Williams
  age: "35"
  gender: male
  email: michael.williams@x.dummyjson.com
  phone: "+49 258-627-6644"
  dateOfBirth: "1989-08-10"
"#;

    #[test]
    fn test_parse_users() {
        let drafts = parse_users(VALID).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].first_name, "Emily");
        assert_eq!(drafts[1].age, 35);
    }

    #[test]
    fn test_parse_users_rejects_invalid_entries() {
        let yaml = r"
- firstName: ''
  lastName: Nobody
  age: 200
  gender: robot
  email: not-an-email
";
        assert!(matches!(parse_users(yaml), Err(SeedError::Invalid(1))));
    }

    #[test]
    fn test_parse_users_rejects_malformed_yaml() {
        assert!(matches!(parse_users("firstName: [unclosed"), Err(SeedError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_users_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("users.yaml");
        let err = users(missing.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }

    #[tokio::test]
    async fn test_users_reports_invalid_file_before_connecting() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "- firstName: ''").unwrap();
        let err = users(file.path().to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, SeedError::Invalid(1)));
    }
}
