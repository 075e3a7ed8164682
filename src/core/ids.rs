use uuid::Uuid;

/// Generate a digits-only business number: UTC timestamp plus a random
/// 6-digit suffix. Composite trade and refund ids are built from these, and
/// the wire format allows ASCII digits only, so no hex or dashes here.
pub fn numeric_no() -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
    let salt = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{}{:06}", timestamp, salt)
}
