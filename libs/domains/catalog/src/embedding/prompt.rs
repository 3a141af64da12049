use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::{CatalogError, CatalogResult};
use crate::models::ImageDescription;

pub const MAX_COLORS: usize = 3;

pub const SYSTEM_PROMPT: &str = r#"You are an assistant that EXAMINES ONE IMAGE supplied by the user and returns ONLY a valid JSON object describing the single MAIN OBJECT visible in it.

Rules:
1) Always return exactly this structure, with the keys in this order:
   {
     "Title": <one short sentence naming what the object is>,
     "Category": <one category, e.g. "electronic component" | "computer part" | "car part" | "tool" | "household appliance" | "furniture" | "clothing" | "other">,
     "DetailedDescription": <precise, 1-3 sentences>,
     "Colors": <array of 1-3 dominant color names, e.g. ["black"] or ["black","silver"]>
   }

2) Describe only the main object. If several objects are visible, pick the one that is visually dominant or most relevant.

3) Colors:
   - Return only the DOMINANT colors (1-3). Do not list every shade.
   - Use basic color names such as "black", "white", "grey", "silver", "blue", "red", "green", "yellow", "brown".
   - If there is a single clear color, return an array with one value.

4) Electronic components:
   - If a type code (e.g. "LM7805", "NE555", "ATmega328P") is READABLE, include it verbatim in DetailedDescription together with the component class it identifies, e.g. "Type code LM7805; voltage regulator (5 V)."
   - If no code is readable, never guess one. Describe the part by its visible features (package, pin count and so on) and do not mention the missing code.

5) Output nothing but the JSON object. No explanations, no extra words, no code fences.

6) Uncertainty:
   - If the category is unclear, use "other" and state the uncertainty briefly in DetailedDescription.
   - Never add fields that are not in the structure above.

7) Formatting:
   - Make sure the JSON is structurally valid.
   - Do not use line breaks or characters that would break the JSON.
   - Do not write "the image shows"; describe the object directly.
   - If a brand or model is clearly readable, mention it in Title as well. Never infer a brand or model that is not clearly visible."#;

pub const USER_INSTRUCTION: &str = "Describe the main object in this image.";

const KEYS: [&str; 4] = ["Title", "Category", "DetailedDescription", "Colors"];

/// Validate a vision-model reply against the description schema.
///
/// The reply must be a JSON object whose keys are exactly `Title`,
/// `Category`, `DetailedDescription` and `Colors`, in that order, with one to
/// [`MAX_COLORS`] non-blank colors. Anything else is a permanent upstream
/// failure: repeating the same image rarely fixes a model that ignores the
/// format.
pub fn parse_image_description(reply: &str) -> CatalogResult<ImageDescription> {
    let OrderedReply(mut description) = serde_json::from_str(reply.trim()).map_err(|e| {
        CatalogError::permanent(format!("vision reply does not match the schema: {}", e))
    })?;

    description.colors = description
        .colors
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    if description.colors.is_empty() || description.colors.len() > MAX_COLORS {
        return Err(CatalogError::permanent(format!(
            "vision reply has {} colors, expected 1-{}",
            description.colors.len(),
            MAX_COLORS
        )));
    }
    if description.colors.iter().any(String::is_empty) {
        return Err(CatalogError::permanent("vision reply contains a blank color"));
    }

    Ok(description)
}

struct OrderedReply(ImageDescription);

impl<'de> Deserialize<'de> for OrderedReply {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedReplyVisitor)
    }
}

struct OrderedReplyVisitor;

impl<'de> Visitor<'de> for OrderedReplyVisitor {
    type Value = OrderedReply;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an object with keys {}", KEYS.join(", "))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        expect_key(&mut map, KEYS[0])?;
        let title: String = map.next_value()?;
        expect_key(&mut map, KEYS[1])?;
        let category: String = map.next_value()?;
        expect_key(&mut map, KEYS[2])?;
        let detailed_description: String = map.next_value()?;
        expect_key(&mut map, KEYS[3])?;
        let colors: Vec<String> = map.next_value()?;

        if let Some(extra) = map.next_key::<String>()? {
            return Err(de::Error::custom(format!("unexpected key '{}'", extra)));
        }

        Ok(OrderedReply(ImageDescription {
            title,
            category,
            detailed_description,
            colors,
        }))
    }
}

fn expect_key<'de, A: MapAccess<'de>>(map: &mut A, expected: &'static str) -> Result<(), A::Error> {
    match map.next_key::<String>()? {
        Some(key) if key == expected => Ok(()),
        Some(key) => Err(de::Error::custom(format!(
            "expected key '{}', found '{}'",
            expected, key
        ))),
        None => Err(de::Error::custom(format!("missing key '{}'", expected))),
    }
}
