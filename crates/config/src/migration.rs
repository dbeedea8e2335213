use crate::ConfigError;
use std::path::Path;
use std::sync::Arc;
use toml_edit::{Array, DocumentMut, Item, Table, Value};

/// Migrates config file to latest format if needed
pub async fn migrate_config_if_needed<P: AsRef<Path>>(
    path: P,
    events: Option<&Arc<attic_events::EventBus>>,
) -> Result<(), ConfigError> {
    let content = tokio::fs::read_to_string(path.as_ref()).await?;
    let mut doc = content.parse::<DocumentMut>()?;

    let added_fields = migrate_document(&mut doc)?;

    // Only write if we added fields
    if !added_fields.is_empty() {
        tokio::fs::write(path.as_ref(), doc.to_string()).await?;

        if let Some(event_bus) = events {
            event_bus.emit(attic_events::AppEvent::ConfigMigrated {
                added_fields: added_fields.clone(),
            });
        }
    }

    Ok(())
}

fn migrate_document(doc: &mut DocumentMut) -> Result<Vec<String>, ConfigError> {
    let mut added_fields = Vec::new();

    migrate_server_section(doc, &mut added_fields)?;
    migrate_storage_section(doc, &mut added_fields)?;

    Ok(added_fields)
}

fn migrate_server_section(
    doc: &mut DocumentMut,
    added_fields: &mut Vec<String>,
) -> Result<(), ConfigError> {
    let server = ensure_table(doc.as_table_mut(), "server", "server", added_fields)?;

    ensure_field(server, "server", "host", Value::from("0.0.0.0"), added_fields);
    ensure_field(server, "server", "port", Value::from(8080), added_fields);
    ensure_field(
        server,
        "server",
        "base_url",
        Value::from("http://localhost:8080"),
        added_fields,
    );
    ensure_field(server, "server", "tcp_nodelay", Value::from(true), added_fields);
    ensure_field(server, "server", "timeout_secs", Value::from(60), added_fields);
    ensure_field(server, "server", "max_body_size_mb", Value::from(100), added_fields);
    ensure_field(
        server,
        "server",
        "max_concurrent_requests",
        Value::from(1000),
        added_fields,
    );
    ensure_field(
        server,
        "server",
        "streaming_threshold_mb",
        Value::from(16),
        added_fields,
    );
    ensure_field(server, "server", "enable_compression", Value::from(true), added_fields);

    if !server.contains_key("allowed_origins") {
        let mut arr = Array::new();
        arr.push("*");
        server["allowed_origins"] = Item::Value(Value::Array(arr));
        added_fields.push("server.allowed_origins".to_string());
    }

    Ok(())
}

fn migrate_storage_section(
    doc: &mut DocumentMut,
    added_fields: &mut Vec<String>,
) -> Result<(), ConfigError> {
    let storage = ensure_table(doc.as_table_mut(), "storage", "storage", added_fields)?;

    ensure_field(storage, "storage", "use_remote", Value::from(false), added_fields);
    ensure_field(
        storage,
        "storage",
        "download_url_expiry_secs",
        Value::from(3600),
        added_fields,
    );
    ensure_field(
        storage,
        "storage",
        "upload_url_expiry_secs",
        Value::from(3600),
        added_fields,
    );

    let local = ensure_table(storage, "local", "storage.local", added_fields)?;
    ensure_field(local, "storage.local", "root_dir", Value::from("uploads"), added_fields);
    ensure_field(local, "storage.local", "url_prefix", Value::from("/files"), added_fields);

    let remote = ensure_table(storage, "remote", "storage.remote", added_fields)?;
    for (key, value) in [
        ("bucket_name", Value::from("")),
        ("region", Value::from("us-east-1")),
        ("endpoint_url", Value::from("")),
        ("force_path_style", Value::from(false)),
        ("key_prefix", Value::from("")),
        ("access_key_id", Value::from("")),
        ("secret_access_key", Value::from("")),
    ] {
        ensure_field(remote, "storage.remote", key, value, added_fields);
    }

    Ok(())
}

fn ensure_table<'a>(
    parent: &'a mut Table,
    key: &str,
    display_name: &str,
    added_fields: &mut Vec<String>,
) -> Result<&'a mut Table, ConfigError> {
    if !parent.contains_key(key) {
        let mut table = Table::new();
        table.set_implicit(true);
        parent[key] = Item::Table(table);
        added_fields.push(display_name.to_string());
    }

    parent[key]
        .as_table_mut()
        .ok_or_else(|| ConfigError::MigrationError(format!("Invalid [{}] section in config", display_name)))
}

fn ensure_field(
    table: &mut Table,
    section: &str,
    key: &str,
    default_value: Value,
    added_fields: &mut Vec<String>,
) {
    if !table.contains_key(key) {
        table[key] = Item::Value(default_value);
        added_fields.push(format!("{}.{}", section, key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, DEFAULT_CONFIG_TEMPLATE};

    #[test]
    fn test_default_template_needs_no_migration() {
        let mut doc = DEFAULT_CONFIG_TEMPLATE.parse::<DocumentMut>().unwrap();
        assert!(migrate_document(&mut doc).unwrap().is_empty());
    }

    #[test]
    fn test_adds_storage_section() {
        let mut doc = r#"
[server]
host = "127.0.0.1"
port = 9000
base_url = "http://localhost:9000"
"#
        .parse::<DocumentMut>()
        .unwrap();

        let added = migrate_document(&mut doc).unwrap();

        assert!(added.contains(&"storage".to_string()));
        assert!(added.contains(&"storage.local.root_dir".to_string()));
        assert!(added.contains(&"storage.remote.bucket_name".to_string()));
        assert!(!added.contains(&"server.host".to_string()));

        // User values survive and the result is a valid config
        let config = Config::from_toml_str(&doc.to_string()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.local.root_dir, "uploads");
        assert_eq!(config.storage.remote.bucket(), None);
    }

    #[test]
    fn test_keeps_existing_remote_values() {
        let mut doc = r#"
[server]
host = "0.0.0.0"
port = 8080
base_url = "http://localhost:8080"

[storage]
use_remote = true

[storage.remote]
bucket_name = "attachments"
"#
        .parse::<DocumentMut>()
        .unwrap();

        migrate_document(&mut doc).unwrap();

        let config = Config::from_toml_str(&doc.to_string()).unwrap();
        assert!(config.storage.wants_remote());
        assert_eq!(config.storage.remote.bucket(), Some("attachments"));
        assert_eq!(config.storage.remote.region, "us-east-1");
    }

    #[test]
    fn test_rejects_non_table_section() {
        let mut doc = "storage = 5\n".parse::<DocumentMut>().unwrap();
        let err = migrate_document(&mut doc).unwrap_err();
        assert!(matches!(err, ConfigError::MigrationError(_)));
    }

    #[tokio::test]
    async fn test_migration_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "[server]\nhost = \"0.0.0.0\"\nport = 8080\nbase_url = \"http://x\"\n")
            .await
            .unwrap();

        migrate_config_if_needed(&path, None).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("[storage.local]"));
        assert!(content.contains("root_dir = \"uploads\""));
    }
}
