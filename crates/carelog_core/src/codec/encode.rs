use crate::model::care::Client;

/// Serializes the whole collection as a JSON array.
///
/// Each client carries `id`, `title`, `createdAt`, `color` and `entries`;
/// the legacy top-level `careInfo` field is never written back.
pub fn encode_clients(clients: &[Client]) -> Result<String, serde_json::Error> {
    serde_json::to_string(clients)
}
