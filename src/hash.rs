//! Canonical hasher (spec §4.1).
//!
//! `hash(artisan, art, timestamp, salt) -> 64-hex`. Pure function, no
//! failure modes at runtime. Determinism is the entire point: any
//! reimplementation that sorts keys, trims strings, and excludes media the
//! same way must produce byte-identical output.

use crate::model::{Art, Artisan};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};

fn trimmed(s: &str) -> String {
    s.trim().to_string()
}

/// Builds the fixed-shape canonical object, excluding `art.photo`/`art.photo_url`.
fn canonical_obj(artisan: &Artisan, art: &Art, timestamp: &str, salt: &str) -> Value {
    json!({
        "artisan": {
            "name": trimmed(&artisan.name),
            "location": trimmed(&artisan.location),
            "contact_number": trimmed(&artisan.contact_number),
            "email": trimmed(&artisan.email),
            "aadhaar_number": trimmed(&artisan.aadhaar_number),
        },
        "art": {
            "name": trimmed(&art.name),
            "description": trimmed(&art.description),
        },
        "timestamp": timestamp,
        "salt": trimmed(salt),
    })
}

/// Serializes a JSON value with keys sorted lexicographically at every
/// level, no extra whitespace, and non-ASCII left unescaped.
///
/// `serde_json::Value` does not preserve sorted-key output by default
/// (object ordering follows `IndexMap`/insertion order unless the
/// `preserve_order` feature is disabled); we reconstruct explicitly sorted
/// maps so the guarantee doesn't depend on that cargo feature.
pub fn canonical_json(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut sorted = Map::new();
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                for key in keys {
                    sorted.insert(key.clone(), sort(&map[key]));
                }
                Value::Object(sorted)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    serde_json::to_string(&sort(value)).expect("canonical value always serializes")
}

/// Computes the 64-hex public hash over `{artisan, art\photo, timestamp, salt}`.
pub fn compute_public_hash(artisan: &Artisan, art: &Art, timestamp: &str, salt: &str) -> String {
    let obj = canonical_obj(artisan, art, timestamp, salt);
    let serialized = canonical_json(&obj);
    let digest = Sha256::digest(serialized.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Artisan, Art) {
        (
            Artisan {
                name: "Meera Sharma".into(),
                location: "Bhuj".into(),
                contact_number: "9800000001".into(),
                email: "m@x".into(),
                aadhaar_number: "123412341234".into(),
            },
            Art {
                name: "Desert Weave".into(),
                description: "Handwoven shawl".into(),
                photo_url: None,
            },
        )
    }

    #[test]
    fn hash_is_deterministic() {
        let (artisan, art) = sample();
        let a = compute_public_hash(&artisan, &art, "2025-01-01T00:00:00Z", &"0".repeat(32));
        let b = compute_public_hash(&artisan, &art, "2025-01-01T00:00:00Z", &"0".repeat(32));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn hash_excludes_photo_url() {
        let (artisan, art) = sample();
        let mut art_with_photo = art.clone();
        art_with_photo.photo_url = Some("https://example.com/photo.jpg".into());
        let without = compute_public_hash(&artisan, &art, "2025-01-01T00:00:00Z", "salt");
        let with = compute_public_hash(&artisan, &art_with_photo, "2025-01-01T00:00:00Z", "salt");
        assert_eq!(without, with);
    }

    #[test]
    fn hash_trims_whitespace_insensitive_fields() {
        let (mut artisan, art) = sample();
        artisan.name = "  Meera Sharma  ".into();
        let (artisan_trimmed, _) = sample();
        let a = compute_public_hash(&artisan, &art, "2025-01-01T00:00:00Z", "salt");
        let b = compute_public_hash(&artisan_trimmed, &art, "2025-01-01T00:00:00Z", "salt");
        assert_eq!(a, b);
    }

    #[test]
    fn canonical_json_sorts_keys_at_every_level() {
        let value = json!({"b": {"z": 1, "a": 2}, "a": 3});
        assert_eq!(canonical_json(&value), r#"{"a":3,"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn different_inputs_hash_differently() {
        let (artisan, art) = sample();
        let a = compute_public_hash(&artisan, &art, "2025-01-01T00:00:00Z", "salt-a");
        let b = compute_public_hash(&artisan, &art, "2025-01-01T00:00:00Z", "salt-b");
        assert_ne!(a, b);
    }
}
