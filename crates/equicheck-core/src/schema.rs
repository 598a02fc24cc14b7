//! Declarative descriptor of the structured output requested from the model.
//!
//! The descriptor is plain data. It serialises into the schema dialect the
//! generative-model API expects (`type` in upper case, `properties`, `items`,
//! `required`, `description`).

use serde::Serialize;

/// One node of the output schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaNode {
    #[serde(flatten)]
    pub kind: SchemaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The type of a schema node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum SchemaKind {
    Object {
        /// Ordered `(field name, node)` pairs.
        #[serde(serialize_with = "ordered_properties")]
        properties: Vec<(String, SchemaNode)>,
        required: Vec<String>,
    },
    Array {
        items: Box<SchemaNode>,
    },
    String,
    Number,
}

impl SchemaNode {
    pub fn string(description: &str) -> Self {
        Self {
            kind: SchemaKind::String,
            description: Some(description.to_string()),
        }
    }

    pub fn number(description: &str) -> Self {
        Self {
            kind: SchemaKind::Number,
            description: Some(description.to_string()),
        }
    }

    pub fn array(items: SchemaNode, description: Option<&str>) -> Self {
        Self {
            kind: SchemaKind::Array {
                items: Box::new(items),
            },
            description: description.map(str::to_string),
        }
    }

    /// An object whose every listed field is required.
    pub fn object(properties: Vec<(&str, SchemaNode)>) -> Self {
        let required = properties.iter().map(|(k, _)| k.to_string()).collect();
        Self {
            kind: SchemaKind::Object {
                properties: properties
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
                required,
            },
            description: None,
        }
    }

    /// Look up a direct property of an object node.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Object { properties, .. } => properties
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Required field names of an object node (empty for other kinds).
    pub fn required(&self) -> &[String] {
        match &self.kind {
            SchemaKind::Object { required, .. } => required,
            _ => &[],
        }
    }
}

fn ordered_properties<S>(properties: &[(String, SchemaNode)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(properties.len()))?;
    for (k, v) in properties {
        map.serialize_entry(k, v)?;
    }
    map.end()
}

/// Schema for a single discrepancy.
pub fn discrepancy_schema() -> SchemaNode {
    SchemaNode::object(vec![
        (
            "category",
            SchemaNode::string(
                "Must be one of: 'Financial Projections', 'Market Sizing', 'Risk Disclosures', 'Operational', 'Legal'.",
            ),
        ),
        (
            "topic",
            SchemaNode::string("The specific topic (e.g., 'EBITDA FY25', 'China Supply Chain')."),
        ),
        (
            "buySideClaim",
            SchemaNode::string("Exact extraction of the finding from the Buy Side Report."),
        ),
        (
            "sellSideClaim",
            SchemaNode::string("Exact extraction of the claim from the Sell Side Memo."),
        ),
        (
            "severity",
            SchemaNode::string("Low, Medium, High, or Critical"),
        ),
        (
            "reasoning",
            SchemaNode::string(
                "Brief explanation of why this is a discrepancy and its impact on valuation.",
            ),
        ),
    ])
}

/// Schema for the model's full output: every analysis field except the id,
/// timestamp, and file names, which are filled in locally.
pub fn analysis_schema() -> SchemaNode {
    SchemaNode::object(vec![
        (
            "executiveSummary",
            SchemaNode::string(
                "A high-level summary of the comparison, specifically mentioning the verdict (Pass/Kill).",
            ),
        ),
        (
            "riskScore",
            SchemaNode::number(
                "A calculated risk score from 0 to 100. 100 means extreme risk/deal breaker.",
            ),
        ),
        (
            "agreementScore",
            SchemaNode::number(
                "A calculated score from 0 to 100 indicating how much the documents agree.",
            ),
        ),
        (
            "strategicAlignment",
            SchemaNode::string(
                "Analysis of whether the strategic visions in both documents align.",
            ),
        ),
        (
            "keyRisks",
            SchemaNode::array(
                SchemaNode {
                    kind: SchemaKind::String,
                    description: None,
                },
                Some(
                    "List of top 3-5 key risks identified (e.g., 'Artificial EBITDA inflation', 'Undisclosed Legal Action').",
                ),
            ),
        ),
        (
            "discrepancies",
            SchemaNode::array(discrepancy_schema(), None),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_level_required_fields() {
        let schema = analysis_schema();
        assert_eq!(
            schema.required(),
            [
                "executiveSummary",
                "riskScore",
                "agreementScore",
                "strategicAlignment",
                "keyRisks",
                "discrepancies"
            ]
        );
        assert!(schema.property("id").is_none());
        assert!(schema.property("timestamp").is_none());
        assert!(schema.property("buySideFileName").is_none());
    }

    #[test]
    fn discrepancy_required_fields() {
        let schema = analysis_schema();
        let items = match &schema.property("discrepancies").unwrap().kind {
            SchemaKind::Array { items } => items,
            other => panic!("expected array, got {other:?}"),
        };
        assert_eq!(
            items.required(),
            [
                "category",
                "topic",
                "buySideClaim",
                "sellSideClaim",
                "severity",
                "reasoning"
            ]
        );
    }

    #[test]
    fn serialises_to_model_dialect() {
        let json = serde_json::to_value(analysis_schema()).unwrap();
        assert_eq!(json["type"], "OBJECT");
        assert_eq!(json["properties"]["riskScore"]["type"], "NUMBER");
        assert_eq!(json["properties"]["keyRisks"]["type"], "ARRAY");
        assert_eq!(json["properties"]["keyRisks"]["items"]["type"], "STRING");
        assert!(json["properties"]["keyRisks"]["items"].get("description").is_none());
        assert_eq!(
            json["properties"]["discrepancies"]["items"]["properties"]["severity"]["description"],
            "Low, Medium, High, or Critical"
        );
        assert_eq!(json["required"].as_array().unwrap().len(), 6);
    }
}
