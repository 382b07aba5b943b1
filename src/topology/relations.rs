use crate::env::Database;

/// One relation of a service as listed in its details panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationRow {
    pub relation_id: String,
    /// The service on the other end; the service itself for peers.
    pub label: String,
    pub interface: String,
    pub name: String,
    pub role: String,
    pub scope: String,
    pub errored: bool,
    /// Units of `label` whose failing hook is a relation hook.
    pub errored_units: Vec<String>,
}

/// Relations of `service_id`, ordered by relation id.
pub fn relation_rows(db: &Database, service_id: &str) -> Vec<RelationRow> {
    let mut rows = db
        .relations_for_service(service_id)
        .into_iter()
        .filter_map(|relation| {
            let near = relation.near(service_id)?;
            let other = relation.far(service_id).unwrap_or(near);
            let other_service = db.service(&other.service);

            Some(RelationRow {
                relation_id: relation.id.clone(),
                label: other.service.clone(),
                interface: relation.interface.clone(),
                name: near.name.clone(),
                role: near.role.clone(),
                scope: relation.scope.clone(),
                errored: other_service.is_some_and(|service| service.has_unit_errors()),
                errored_units: other_service
                    .map(|service| {
                        service
                            .units
                            .iter()
                            .filter(|unit| unit.failed_in_relation_hook())
                            .map(|unit| unit.id.clone())
                            .collect()
                    })
                    .unwrap_or_default(),
            })
        })
        .collect::<Vec<_>>();

    rows.sort_by(|a, b| a.relation_id.cmp(&b.relation_id));
    rows
}
