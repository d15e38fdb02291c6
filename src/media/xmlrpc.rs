//! XML-RPC encoding for the WordPress `wp.uploadFile` method.

use crate::models::{UploadRequest, UploadResult};
use crate::{Error, Result};
use base64::Engine as _;
use roxmltree::{Document, Node};
use std::collections::HashMap;

const METHOD: &str = "wp.uploadFile";
const BLOG_ID: i32 = 0;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn string_value(text: &str) -> String {
    format!("<value><string>{}</string></value>", escape(text))
}

fn member(name: &str, value: &str) -> String {
    format!("<member><name>{}</name>{}</member>", name, value)
}

/// Build the `methodCall` body for one upload.
pub fn encode_upload_file(user: &str, password: &str, request: &UploadRequest) -> String {
    let bits = base64::engine::general_purpose::STANDARD.encode(&request.bits);

    let data = [
        member("name", &string_value(&request.name)),
        member("type", &string_value(&request.mime_type)),
        member("bits", &format!("<value><base64>{}</base64></value>", bits)),
        member("overwrite", "<value><boolean>0</boolean></value>"),
    ]
    .concat();

    let params = [
        format!("<value><int>{}</int></value>", BLOG_ID),
        string_value(user),
        string_value(password),
        format!("<value><struct>{}</struct></value>", data),
    ]
    .iter()
    .map(|value| format!("<param>{}</param>", value))
    .collect::<String>();

    format!(
        "<?xml version=\"1.0\"?>\n<methodCall><methodName>{}</methodName><params>{}</params></methodCall>",
        METHOD, params
    )
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

/// Text of a scalar `<value>`, typed (`<string>`, `<int>`, ...) or bare.
fn scalar(value: Node) -> String {
    match value.children().find(|n| n.is_element()) {
        Some(typed) => typed.text().unwrap_or_default().to_string(),
        None => value.text().unwrap_or_default().to_string(),
    }
}

fn struct_members(value: Node) -> Result<HashMap<String, String>> {
    let fields = child(value, "struct")
        .ok_or_else(|| Error::Rpc("expected a struct value".to_string()))?;

    let mut members = HashMap::new();
    for member in fields.children().filter(|n| n.has_tag_name("member")) {
        let name = child(member, "name").and_then(|n| n.text());
        let value = child(member, "value");
        if let (Some(name), Some(value)) = (name, value) {
            members.insert(name.trim().to_string(), scalar(value));
        }
    }
    Ok(members)
}

/// Parse a `methodResponse` from `wp.uploadFile`.
pub fn decode_upload_response(body: &str) -> Result<UploadResult> {
    let doc = Document::parse(body)?;
    let root = doc.root_element();
    if !root.has_tag_name("methodResponse") {
        return Err(Error::Rpc(format!(
            "unexpected root element <{}>",
            root.tag_name().name()
        )));
    }

    if let Some(fault) = child(root, "fault") {
        let value = child(fault, "value")
            .ok_or_else(|| Error::Rpc("fault without value".to_string()))?;
        let members = struct_members(value)?;
        let code = members
            .get("faultCode")
            .and_then(|c| c.trim().parse().ok())
            .unwrap_or_default();
        let message = members.get("faultString").cloned().unwrap_or_default();
        return Err(Error::RpcFault { code, message });
    }

    let value = child(root, "params")
        .and_then(|params| child(params, "param"))
        .and_then(|param| child(param, "value"))
        .ok_or_else(|| Error::Rpc("response has no return value".to_string()))?;
    let mut members = struct_members(value)?;

    let mut take = |key: &str| {
        members
            .remove(key)
            .ok_or_else(|| Error::Rpc(format!("response is missing '{}'", key)))
    };

    Ok(UploadResult {
        id: take("id")?.trim().to_string(),
        url: take("url")?,
        mime_type: take("type")?,
    })
}
