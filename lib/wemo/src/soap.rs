pub const BASIC_EVENT: Service = Service {
    urn: "urn:Belkin:service:basicevent:1",
    control_path: ["upnp", "control", "basicevent1"],
};

pub const INSIGHT: Service = Service {
    urn: "urn:Belkin:service:insight:1",
    control_path: ["upnp", "control", "insight1"],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    pub urn: &'static str,
    pub control_path: [&'static str; 3],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub service: Service,
    pub name: &'static str,
    pub argument: Option<(&'static str, String)>,
}

impl Action {
    pub fn new(service: Service, name: &'static str) -> Self {
        Self {
            service,
            name,
            argument: None,
        }
    }

    pub fn with_argument(mut self, name: &'static str, value: impl ToString) -> Self {
        self.argument = Some((name, value.to_string()));
        self
    }

    /// Value of the `SOAPACTION` header.
    pub fn header(&self) -> String {
        format!("\"{}#{}\"", self.service.urn, self.name)
    }

    pub fn envelope(&self) -> String {
        let argument = match &self.argument {
            Some((name, value)) => format!("<{name}>{}</{name}>", escape(value)),
            None => String::new(),
        };

        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
                r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
                "<s:Body>",
                r#"<u:{action} xmlns:u="{urn}">{argument}</u:{action}>"#,
                "</s:Body>",
                "</s:Envelope>",
            ),
            action = self.name,
            urn = self.service.urn,
            argument = argument,
        )
    }
}

/// Text content of the first `<tag>` element in `body`, unescaped.
/// Namespace prefixes on the element are accepted.
pub fn extract_value(body: &str, tag: &str) -> Option<String> {
    let mut rest = body;

    while let Some(open) = rest.find('<') {
        rest = &rest[open + 1..];
        let close = rest.find('>')?;
        let element = &rest[..close];
        rest = &rest[close + 1..];

        if element.starts_with('/') || element.starts_with('?') {
            continue;
        }

        let name = element
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let local = name.rsplit(':').next().unwrap_or(name);

        if local != tag {
            continue;
        }

        if element.ends_with('/') {
            return Some(String::new());
        }

        let end = rest.find(&format!("</{name}>"))?;
        return Some(unescape(&rest[..end]));
    }

    None
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_envelope() {
        let action = Action::new(INSIGHT, "GetInsightParams");

        assert_eq!(action.header(), r#""urn:Belkin:service:insight:1#GetInsightParams""#);
        assert!(action.envelope().contains(
            r#"<s:Body><u:GetInsightParams xmlns:u="urn:Belkin:service:insight:1"></u:GetInsightParams></s:Body>"#
        ));
    }

    #[test]
    fn test_set_envelope() {
        let action = Action::new(BASIC_EVENT, "SetBinaryState").with_argument("BinaryState", 1);

        assert!(action.envelope().contains(
            r#"<u:SetBinaryState xmlns:u="urn:Belkin:service:basicevent:1"><BinaryState>1</BinaryState></u:SetBinaryState>"#
        ));
    }

    #[test]
    fn test_extract_value() {
        let body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>
<u:GetFriendlyNameResponse xmlns:u="urn:Belkin:service:basicevent:1">
<FriendlyName>Rig &amp; Co</FriendlyName>
</u:GetFriendlyNameResponse>
</s:Body> </s:Envelope>"#;

        assert_eq!(extract_value(body, "FriendlyName").as_deref(), Some("Rig & Co"));
        assert_eq!(extract_value(body, "BinaryState"), None);
    }

    #[test]
    fn test_extract_value_empty_element() {
        assert_eq!(
            extract_value("<s:Body><InsightParams/></s:Body>", "InsightParams").as_deref(),
            Some("")
        );
        assert_eq!(extract_value("<InsightParams>8|1", "InsightParams"), None);
    }
}
