use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use super::model::{Database, Relation, Service};

const DEMO_ENVIRONMENT: &str = r#"{
  "services": [
    {
      "id": "juju-gui",
      "charm": "cs:precise/juju-gui-42",
      "exposed": true,
      "units": [{ "id": "juju-gui/0", "agent_state": "started" }],
      "annotations": { "gui.x": 120, "gui.y": 80 }
    },
    {
      "id": "wordpress",
      "charm": "cs:precise/wordpress-15",
      "exposed": true,
      "units": [
        { "id": "wordpress/0", "agent_state": "started" },
        { "id": "wordpress/1", "agent_state": "started" },
        { "id": "wordpress/2", "agent_state": "pending" }
      ]
    },
    {
      "id": "mysql",
      "charm": "cs:precise/mysql-26",
      "units": [
        { "id": "mysql/0", "agent_state": "started" },
        {
          "id": "mysql/1",
          "agent_state": "error",
          "agent_state_hook": "db-relation-changed"
        }
      ]
    },
    {
      "id": "memcached",
      "charm": "cs:precise/memcached-7",
      "units": [{ "id": "memcached/0", "agent_state": "started" }]
    },
    {
      "id": "rsyslog-forwarder",
      "charm": "cs:precise/rsyslog-forwarder-4",
      "subordinate": true
    }
  ],
  "relations": [
    {
      "id": "relation-0",
      "interface": "mysql",
      "endpoints": [
        { "service": "wordpress", "name": "db", "role": "client" },
        { "service": "mysql", "name": "db", "role": "server" }
      ]
    },
    {
      "id": "relation-1",
      "interface": "memcache",
      "endpoints": [
        { "service": "wordpress", "name": "cache", "role": "client" },
        { "service": "memcached", "name": "cache", "role": "server" }
      ]
    },
    {
      "id": "relation-2",
      "interface": "syslog",
      "scope": "container",
      "endpoints": [
        { "service": "mysql", "name": "juju-info", "role": "provider" },
        { "service": "rsyslog-forwarder", "name": "juju-info", "role": "requirer" }
      ]
    },
    {
      "id": "relation-3",
      "interface": "mysql-replication",
      "endpoints": [{ "service": "mysql", "name": "cluster", "role": "peer" }]
    }
  ]
}"#;

#[derive(Debug, Deserialize)]
struct RawEnvironment {
    #[serde(default)]
    services: Vec<Service>,
    #[serde(default)]
    relations: Vec<Relation>,
}

pub fn load_database(path: &Path) -> Result<Database> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read environment fixture {}", path.display()))?;
    parse_database(&raw)
        .with_context(|| format!("failed to parse environment fixture {}", path.display()))
}

pub fn demo_database() -> Result<Database> {
    parse_database(DEMO_ENVIRONMENT).context("built-in demo environment is invalid")
}

fn parse_database(raw: &str) -> Result<Database> {
    let parsed: RawEnvironment = serde_json::from_str(raw).context("invalid environment JSON")?;

    let mut seen = HashSet::with_capacity(parsed.services.len());
    for service in &parsed.services {
        if service.id.is_empty() {
            return Err(anyhow!("service with an empty id"));
        }
        if !seen.insert(service.id.as_str()) {
            return Err(anyhow!("duplicate service id {}", service.id));
        }
    }

    for relation in &parsed.relations {
        if let Some(endpoint) = relation
            .endpoints
            .iter()
            .find(|endpoint| !seen.contains(endpoint.service.as_str()))
        {
            return Err(anyhow!(
                "relation {} references unknown service {}",
                relation.id,
                endpoint.service
            ));
        }
    }

    Ok(Database::new(parsed.services, parsed.relations))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn demo_environment_parses() {
        let db = demo_database().expect("demo parses");
        assert_eq!(db.services().len(), 5);
        assert_eq!(db.relations_for_service("mysql").len(), 3);
        assert!(db.service("rsyslog-forwarder").is_some_and(|s| s.subordinate));
    }

    #[test]
    fn duplicate_service_ids_are_rejected() {
        let raw = r#"{ "services": [{ "id": "mysql" }, { "id": "mysql" }] }"#;
        let error = parse_database(raw).expect_err("duplicates rejected");
        assert!(error.to_string().contains("duplicate service id mysql"));
    }

    #[test]
    fn dangling_relation_endpoint_is_rejected() {
        let raw = r#"{
            "services": [{ "id": "mysql" }],
            "relations": [{
                "id": "relation-9",
                "interface": "mysql",
                "endpoints": [{ "service": "ghost", "name": "db" }]
            }]
        }"#;
        assert!(parse_database(raw).is_err());
    }

    #[test]
    fn loads_fixture_from_disk() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{ "services": [{{ "id": "haproxy", "units": [{{ "id": "haproxy/0" }}] }}] }}"#
        )
        .expect("write fixture");

        let db = load_database(file.path()).expect("fixture loads");
        let service = db.service("haproxy").expect("service present");
        assert_eq!(service.unit_count(), 1);
        assert!(db.relations().is_empty());
    }

    #[test]
    fn missing_fixture_reports_path() {
        let error = load_database(Path::new("/nonexistent/env.json")).expect_err("missing file");
        assert!(format!("{error:#}").contains("/nonexistent/env.json"));
    }
}
