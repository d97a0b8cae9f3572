//! Static-site rendering: substitute `{{placeholder}}` tokens in the shared
//! binder template and generate the repository README. Pure string work, no
//! I/O; the template ships inside the binary.

use chrono::{DateTime, Utc};
use rust_embed::Embed;

use crate::errors::RenderError;
use crate::models::CustomerConfig;

#[derive(Embed)]
#[folder = "$CARGO_MANIFEST_DIR/templates"]
struct Templates;

/// Name of the shared site template.
pub const SITE_TEMPLATE: &str = "binder.html";

/// Read an embedded template by file name.
pub fn load_template(name: &str) -> Result<String, RenderError> {
    let file = Templates::get(name).ok_or_else(|| RenderError::TemplateMissing {
        name: name.to_string(),
    })?;
    Ok(String::from_utf8_lossy(&file.data).into_owned())
}

/// Escape serialized JSON for inline `<script>` embedding: a literal `</`
/// inside a string would otherwise terminate the script element early.
fn escape_for_script(json: String) -> String {
    json.replace("</", "<\\/")
}

/// Render the customer's site page from `template`.
///
/// Substitutes every `{{name}}` token; the chemical data is embedded as two
/// JSON blobs (active chemicals and customer info) for the page script.
/// Leftover `{{` after substitution means the template references a
/// placeholder this renderer does not provide, which is an error rather
/// than a page with visible `{{tokens}}`.
pub fn render_site(
    template: &str,
    config: &CustomerConfig,
    generated_at: DateTime<Utc>,
) -> Result<String, RenderError> {
    let active: Vec<_> = config.active_chemicals().collect();
    let products_json = escape_for_script(serde_json::to_string(&active)?);
    let customer_json = escape_for_script(serde_json::to_string(&config.customer_info)?);

    let info = &config.customer_info;
    let logo_url = info
        .branding
        .logo
        .as_deref()
        .map(|name| format!("assets/{}", name))
        .unwrap_or_default();

    let values: Vec<(&str, String)> = vec![
        ("customer_name", info.name.clone()),
        ("seo_title", config.site_settings.seo.title.clone()),
        ("seo_description", config.site_settings.seo.description.clone()),
        ("primary_color", info.branding.primary_color.clone()),
        ("secondary_color", info.branding.secondary_color.clone()),
        ("logo_url", logo_url),
        ("contact_phone", info.contact.phone.clone()),
        ("contact_email", info.contact.email.clone()),
        ("emergency_phone", info.contact.emergency_phone.clone()),
        ("address", info.contact.address.clone()),
        ("chemical_count", active.len().to_string()),
        ("last_updated", config.site_settings.last_updated.to_string()),
        ("generated_at", generated_at.to_rfc3339()),
        ("version", config.deployment.version.clone()),
        ("products_json", products_json),
        ("customer_json", customer_json),
    ];

    let mut out = template.to_string();
    for (name, value) in &values {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }

    if let Some(start) = out.find("{{") {
        let rest = &out[start + 2..];
        let name = rest
            .split("}}")
            .next()
            .unwrap_or("")
            .chars()
            .take(60)
            .collect::<String>();
        return Err(RenderError::UnresolvedPlaceholder { name });
    }
    Ok(out)
}

/// Repository README shown on GitHub itself, not on the published site.
pub fn render_readme(config: &CustomerConfig) -> String {
    let info = &config.customer_info;
    format!(
        "# {name} - GHS Safety Binder\n\n\
         Static safety-binder site for {name}. Generated and deployed by bindery;\n\
         do not edit files in this repository by hand, they are overwritten on\n\
         every deployment.\n\n\
         - Active chemicals: {active}\n\
         - Total records: {total}\n\
         - Site: {url}\n\n\
         Safety Data Sheets are provided for GHS/HazCom compliance. Verify you\n\
         are reading the current revision before relying on any document.\n",
        name = info.name,
        active = config.active_count(),
        total = config.chemicals.len(),
        url = config.site_url(),
    )
}
