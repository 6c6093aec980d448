//! Element locators
//!
//! A locator describes how to find elements at the moment a step runs: by
//! CSS selector, by visible text, or by ARIA role and accessible name. The
//! description is evaluated in the page by a small resolver script, so the
//! same locator can be probed repeatedly while the UI re-renders.
//!
//! In scenario files a locator is either a string (`"text=Logout"` is a text
//! locator, anything else is CSS) or a map:
//!
//! ```yaml
//! locator:
//!   role: button
//!   name: member
//!   exact: true
//!   within: { role: listitem, has_text: Member User }
//! ```

use std::fmt;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::common::{Error, Result};

/// In-page resolver, called as `(spec, op, arg)`
const RESOLVER_JS: &str = include_str!("resolver.js");

/// What a locator selects on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Css(String),
    Text(String),
    Role { role: String, name: Option<String> },
}

/// Element locator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "LocatorDef")]
pub struct Locator {
    pub target: Target,
    /// Text and name must equal (whitespace-normalized) rather than contain
    pub exact: bool,
    /// Keep only elements whose text contains this
    pub has_text: Option<String>,
    /// Search only inside the elements matched by this locator
    pub within: Option<Box<Locator>>,
    /// Pick one match by index; negative counts from the end
    pub nth: Option<i32>,
}

impl Locator {
    fn from_target(target: Target) -> Self {
        Self {
            target,
            exact: false,
            has_text: None,
            within: None,
            nth: None,
        }
    }

    pub fn css(selector: &str) -> Self {
        Self::from_target(Target::Css(selector.to_string()))
    }

    pub fn text(text: &str) -> Self {
        Self::from_target(Target::Text(text.to_string()))
    }

    pub fn role(role: &str, name: Option<&str>) -> Self {
        Self::from_target(Target::Role {
            role: role.to_string(),
            name: name.map(str::to_string),
        })
    }

    /// Parse the string shorthand: `text=...` or a CSS selector
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let locator = match s.strip_prefix("text=") {
            Some(text) => Self::text(strip_quotes(text)),
            None => Self::css(s),
        };
        locator.validate()?;
        Ok(locator)
    }

    pub fn exact(mut self) -> Self {
        self.exact = true;
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.has_text = Some(text.to_string());
        self
    }

    pub fn inside(mut self, parent: Locator) -> Self {
        self.within = Some(Box::new(parent));
        self
    }

    pub fn nth(mut self, index: i32) -> Self {
        self.nth = Some(index);
        self
    }

    /// Check the locator is well-formed, including its `within` chain
    pub fn validate(&self) -> Result<()> {
        match &self.target {
            Target::Css(selector) if selector.trim().is_empty() => {
                return Err(Error::InvalidLocator("empty CSS selector".to_string()));
            }
            Target::Text(text) if text.trim().is_empty() => {
                return Err(Error::InvalidLocator("empty text locator".to_string()));
            }
            Target::Role { role, .. }
                if role.is_empty() || !role.chars().all(|c| c.is_ascii_alphabetic()) =>
            {
                return Err(Error::InvalidLocator(format!("invalid role '{}'", role)));
            }
            _ => {}
        }
        if let Some(parent) = &self.within {
            parent.validate()?;
        }
        Ok(())
    }

    /// JSON description consumed by the resolver script
    pub fn to_spec(&self) -> Value {
        let mut spec = match &self.target {
            Target::Css(selector) => json!({ "css": selector }),
            Target::Text(text) => json!({ "text": text }),
            Target::Role { role, name } => json!({ "role": role, "name": name }),
        };
        spec["exact"] = json!(self.exact);
        spec["has_text"] = json!(self.has_text);
        spec["nth"] = json!(self.nth);
        spec["within"] = match &self.within {
            Some(parent) => parent.to_spec(),
            None => Value::Null,
        };
        spec
    }

    /// JavaScript expression that runs `op` against this locator
    pub fn script(&self, op: ResolverOp, arg: Option<&str>) -> String {
        format!(
            "({})({}, {}, {})",
            RESOLVER_JS.trim(),
            self.to_spec(),
            json!(op.as_str()),
            json!(arg)
        )
    }
}

/// Operations the resolver script supports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverOp {
    /// Count attached and visible matches
    Probe,
    /// Scroll the single match into view and return its centre
    Point,
    /// Set the value of the single match and fire input/change
    Fill,
}

impl ResolverOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolverOp::Probe => "probe",
            ResolverOp::Point => "point",
            ResolverOp::Fill => "fill",
        }
    }
}

/// Reply of the resolver script
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverReply {
    pub count: usize,
    #[serde(default)]
    pub visible: usize,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub error: Option<String>,
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for q in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(parent) = &self.within {
            write!(f, "{} >> ", parent)?;
        }
        match &self.target {
            Target::Css(selector) => write!(f, "css={}", selector)?,
            Target::Text(text) => write!(f, "text={:?}", text)?,
            Target::Role { role, name } => {
                write!(f, "role={}", role)?;
                if let Some(name) = name {
                    write!(f, "[name={:?}]", name)?;
                }
            }
        }
        if self.exact {
            f.write_str("[exact]")?;
        }
        if let Some(text) = &self.has_text {
            write!(f, " >> has_text={:?}", text)?;
        }
        if let Some(n) = self.nth {
            write!(f, " >> nth={}", n)?;
        }
        Ok(())
    }
}

/// Scenario-file form of a locator
#[derive(Deserialize)]
#[serde(untagged)]
enum LocatorDef {
    Short(String),
    Full(LocatorFields),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LocatorFields {
    css: Option<String>,
    text: Option<String>,
    role: Option<String>,
    name: Option<String>,
    #[serde(default)]
    exact: bool,
    has_text: Option<String>,
    within: Option<Box<Locator>>,
    nth: Option<i32>,
}

impl TryFrom<LocatorDef> for Locator {
    type Error = String;

    fn try_from(def: LocatorDef) -> std::result::Result<Self, Self::Error> {
        let fields = match def {
            LocatorDef::Short(s) => return Locator::parse(&s).map_err(|e| e.to_string()),
            LocatorDef::Full(fields) => fields,
        };

        let target = match (fields.css, fields.text, fields.role) {
            (Some(css), None, None) => Target::Css(css),
            (None, Some(text), None) => Target::Text(text),
            (None, None, Some(role)) => Target::Role {
                role,
                name: fields.name.clone(),
            },
            (None, None, None) => {
                return Err("locator needs one of 'css', 'text' or 'role'".to_string())
            }
            _ => return Err("locator must set only one of 'css', 'text' or 'role'".to_string()),
        };
        if fields.name.is_some() && !matches!(target, Target::Role { .. }) {
            return Err("'name' is only valid together with 'role'".to_string());
        }

        let locator = Locator {
            target,
            exact: fields.exact,
            has_text: fields.has_text,
            within: fields.within,
            nth: fields.nth,
        };
        locator.validate().map_err(|e| e.to_string())?;
        Ok(locator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> std::result::Result<Locator, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[test]
    fn test_string_shorthand() {
        assert_eq!(Locator::parse("text=Fix Login Bug").unwrap(), Locator::text("Fix Login Bug"));
        assert_eq!(Locator::parse("text='Done'").unwrap(), Locator::text("Done"));
        assert_eq!(
            Locator::parse("input[name='title']").unwrap(),
            Locator::css("input[name='title']")
        );
        assert!(Locator::parse("text=").is_err());
        assert!(Locator::parse("  ").is_err());
    }

    #[test]
    fn test_yaml_role_with_scope() {
        let locator = from_yaml(
            r#"
            role: button
            name: member
            exact: true
            within: { role: listitem, has_text: Member User }
            "#,
        )
        .unwrap();

        let expected = Locator::role("button", Some("member"))
            .exact()
            .inside(Locator::role("listitem", None).with_text("Member User"));
        assert_eq!(locator, expected);
    }

    #[test]
    fn test_yaml_shorthand_in_within() {
        let locator = from_yaml("{ css: img, within: \"button[aria-label='Open user menu']\" }").unwrap();
        assert_eq!(
            locator.within.as_deref(),
            Some(&Locator::css("button[aria-label='Open user menu']"))
        );
    }

    #[test]
    fn test_yaml_rejects_ambiguous_target() {
        assert!(from_yaml("{ css: button, text: Save }").is_err());
        assert!(from_yaml("{ exact: true }").is_err());
        assert!(from_yaml("{ text: Save, name: Save }").is_err());
        assert!(from_yaml("{ role: 'menu item' }").is_err());
        assert!(from_yaml("{ css: button, colour: red }").is_err());
    }

    #[test]
    fn test_spec_json() {
        let spec = Locator::role("menuitem", Some("Admin")).nth(-1).to_spec();
        assert_eq!(spec["role"], "menuitem");
        assert_eq!(spec["name"], "Admin");
        assert_eq!(spec["exact"], false);
        assert_eq!(spec["nth"], -1);
        assert!(spec["within"].is_null());
        assert!(spec.get("css").is_none());
    }

    #[test]
    fn test_script_embeds_arguments_as_json() {
        let script = Locator::css("input[name=\"title\"]").script(ResolverOp::Fill, Some("It's \"quoted\""));
        assert!(script.starts_with("((spec, op, arg) =>"));
        assert!(script.contains(r#""css":"input[name=\"title\"]""#));
        assert!(script.contains(r#""fill""#));
        assert!(script.ends_with(r#", "It's \"quoted\"")"#));

        let probe = Locator::text("x").script(ResolverOp::Probe, None);
        assert!(probe.ends_with(", \"probe\", null)"));
    }

    #[test]
    fn test_display() {
        let locator = Locator::role("button", Some("member"))
            .exact()
            .inside(Locator::role("listitem", None).with_text("Member User"));
        assert_eq!(
            locator.to_string(),
            r#"role=listitem >> has_text="Member User" >> role=button[name="member"][exact]"#
        );
        assert_eq!(Locator::text("New").nth(0).to_string(), r#"text="New" >> nth=0"#);
    }

    #[test]
    fn test_reply_defaults() {
        let reply: ResolverReply = serde_json::from_value(json!({"count": 2})).unwrap();
        assert_eq!(reply.count, 2);
        assert_eq!(reply.visible, 0);
        assert!(reply.x.is_none());
    }
}
