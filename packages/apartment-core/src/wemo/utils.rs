//! Shared helpers for WeMo HTTP and XML handling.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Url;

/// Builds a device URL from a `host:port` pair and an endpoint path.
pub fn build_device_url(host: &str, endpoint: &str) -> String {
    format!("http://{}{}", host, endpoint)
}

/// Extracts and entity-decodes the text of the first element named
/// `element_name`, matching on local name so namespace prefixes are ignored.
pub fn extract_xml_text(xml: &str, element_name: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let target_bytes = element_name.as_bytes();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == target_bytes => {
                if let Ok(text) = reader.read_text(e.name()) {
                    let decoded = html_escape::decode_html_entities(&text);
                    return Some(decoded.to_string());
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    None
}

/// Extracts `host:port` from an SSDP `LOCATION` URL.
///
/// Returns `None` for unparsable URLs or URLs without a host. The port is
/// always included, falling back to the scheme default.
pub fn host_from_location(location: &str) -> Option<String> {
    let url = Url::parse(location).ok()?;
    let host = url.host_str()?;
    let port = url.port_or_known_default()?;
    Some(format!("{}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_xml_text_ignores_namespace_prefix() {
        let xml = r#"<s:Envelope><s:Body><u:R xmlns:u="x"><BinaryState>1</BinaryState></u:R></s:Body></s:Envelope>"#;
        assert_eq!(extract_xml_text(xml, "BinaryState").as_deref(), Some("1"));
        assert_eq!(extract_xml_text(xml, "Missing"), None);
    }

    #[test]
    fn extract_xml_text_decodes_entities() {
        let xml = "<root><friendlyName>Tom &amp; Jerry</friendlyName></root>";
        assert_eq!(
            extract_xml_text(xml, "friendlyName").as_deref(),
            Some("Tom & Jerry")
        );
    }

    #[test]
    fn host_from_location_keeps_port() {
        assert_eq!(
            host_from_location("http://192.168.1.187:49153/setup.xml").as_deref(),
            Some("192.168.1.187:49153")
        );
        assert_eq!(
            host_from_location("http://10.0.0.4/setup.xml").as_deref(),
            Some("10.0.0.4:80")
        );
        assert_eq!(host_from_location("not a url"), None);
    }
}
