//! API models for request/response types.
//!
//! Defines the form request and JSON response structures for the search API.

use serde::{Deserialize, Serialize};

/// Class filter accepted by the search endpoint. `ALL` disables filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassFilter {
    #[serde(rename = "ALL")]
    All,
    #[serde(rename = "class-a")]
    ClassA,
    #[serde(rename = "class-b")]
    ClassB,
}

impl ClassFilter {
    /// The concrete tag to filter on, if any.
    pub fn as_tag(self) -> Option<ClassTag> {
        match self {
            ClassFilter::All => None,
            ClassFilter::ClassA => Some(ClassTag::ClassA),
            ClassFilter::ClassB => Some(ClassTag::ClassB),
        }
    }
}

/// Class tag stored as record metadata. The update endpoint only accepts
/// these two values; `ALL` is not valid there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassTag {
    #[serde(rename = "class-a")]
    ClassA,
    #[serde(rename = "class-b")]
    ClassB,
}

impl ClassTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassTag::ClassA => "class-a",
            ClassTag::ClassB => "class-b",
        }
    }
}

/// Operation selector for the update endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateCase {
    Upsert,
    Delete,
}

/// Form fields for the similarity search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub image_url: String,
    pub top_k: i64,
    #[serde(default)]
    pub threshold: Option<f32>,
    pub class_type: ClassFilter,
}

/// Form fields for the upsert/delete endpoint. `image_url` and `class_type`
/// are only required for the upsert case; the handler enforces that.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateParams {
    pub image_id: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub class_type: Option<ClassTag>,
    pub case: UpdateCase,
}

/// A single similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Record id in the index.
    pub id: i64,
    /// Similarity score in the index's native range.
    pub score: f32,
    /// Stored metadata class tag.
    pub class: String,
}

/// Response body for the update endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub model: String,
    pub dimension: u32,
    pub index: String,
    pub endpoints: Vec<String>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_filter_wire_names() {
        let all: ClassFilter = serde_json::from_str("\"ALL\"").unwrap();
        assert_eq!(all, ClassFilter::All);
        let a: ClassFilter = serde_json::from_str("\"class-a\"").unwrap();
        assert_eq!(a, ClassFilter::ClassA);
        let b: ClassFilter = serde_json::from_str("\"class-b\"").unwrap();
        assert_eq!(b, ClassFilter::ClassB);

        assert!(serde_json::from_str::<ClassFilter>("\"class-c\"").is_err());
    }

    #[test]
    fn test_class_tag_rejects_all() {
        assert!(serde_json::from_str::<ClassTag>("\"ALL\"").is_err());
        let a: ClassTag = serde_json::from_str("\"class-a\"").unwrap();
        assert_eq!(a.as_str(), "class-a");
    }

    #[test]
    fn test_filter_to_tag() {
        assert_eq!(ClassFilter::All.as_tag(), None);
        assert_eq!(ClassFilter::ClassA.as_tag(), Some(ClassTag::ClassA));
        assert_eq!(ClassFilter::ClassB.as_tag(), Some(ClassTag::ClassB));
    }

    #[test]
    fn test_search_params_from_form() {
        let params: SearchParams = serde_urlencoded_from(
            "image_url=http%3A%2F%2Fexample.com%2Fdog.jpg&top_k=5&class_type=ALL",
        );
        assert_eq!(params.image_url, "http://example.com/dog.jpg");
        assert_eq!(params.top_k, 5);
        assert_eq!(params.threshold, None);
        assert_eq!(params.class_type, ClassFilter::All);

        let params: SearchParams = serde_urlencoded_from(
            "image_url=http%3A%2F%2Fexample.com%2Fdog.jpg&top_k=3&threshold=0.8&class_type=class-b",
        );
        assert_eq!(params.threshold, Some(0.8));
        assert_eq!(params.class_type, ClassFilter::ClassB);
    }

    #[test]
    fn test_update_params_delete_without_url() {
        let params: UpdateParams = serde_urlencoded_from("image_id=42&case=Delete");
        assert_eq!(params.image_id, 42);
        assert_eq!(params.case, UpdateCase::Delete);
        assert!(params.image_url.is_none());
        assert!(params.class_type.is_none());
    }

    #[test]
    fn test_search_hit_json_shape() {
        let hit = SearchHit {
            id: 7,
            score: 0.91,
            class: "class-a".to_string(),
        };
        let json = serde_json::to_value(&hit).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["class"], "class-a");
        assert!((json["score"].as_f64().unwrap() - 0.91).abs() < 1e-6);
    }

    fn serde_urlencoded_from<T: serde::de::DeserializeOwned>(query: &str) -> T {
        serde_urlencoded::from_str(query).unwrap()
    }
}
