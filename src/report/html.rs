//! HTML report rendering
//!
//! Each report row becomes two table rows: a clickable summary (URL, impact,
//! description and a "Show Details" button) and a hidden detail row with the
//! affected nodes, help text, help link and rule id. The rows are substituted
//! into the `{{TABLE_ROWS}}` placeholder of a template.

use crate::report::model::{ReportModel, ReportRow};
use crate::report::{ReportError, TABLE_ROWS_PLACEHOLDER};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use url::Url;

/// Template used when no custom template is configured
pub const DEFAULT_TEMPLATE: &str = include_str!("template.html");

/// Loads the report template
///
/// # Arguments
///
/// * `path` - Custom template file, or `None` for [`DEFAULT_TEMPLATE`]
///
/// # Returns
///
/// * `Ok(String)` - The template text
/// * `Err(ReportError)` - The file could not be read or has no placeholder
pub fn load_template(path: Option<&Path>) -> Result<String, ReportError> {
    let Some(path) = path else {
        return Ok(DEFAULT_TEMPLATE.to_string());
    };

    let template = fs::read_to_string(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !template.contains(TABLE_ROWS_PLACEHOLDER) {
        return Err(ReportError::MissingPlaceholder(path.display().to_string()));
    }

    Ok(template)
}

/// Renders the table rows of a report
pub fn render_rows(model: &ReportModel) -> String {
    let mut html = String::new();
    for row in &model.rows {
        write_row(&mut html, row);
    }
    html
}

fn write_row(html: &mut String, row: &ReportRow) {
    let id = row.details_id();
    let v = &row.violation;

    // Writing to a String cannot fail
    let _ = write!(
        html,
        r#"
      <tr onclick="toggleDetails('{id}')" style="cursor: pointer;">
        <td>{url}</td>
        <td>{impact}</td>
        <td>{description}</td>
        <td><button onclick="toggleDetails('{id}'); event.stopPropagation();">Show Details</button></td>
      </tr>
      <tr id="{id}" class="hidden-row">
        <td colspan="4">
          <strong>Node:</strong> {nodes}<br>
          <strong>Help:</strong> {help}<br>
          <strong>Help URL:</strong> {help_link}<br>
          <strong>Violation ID:</strong> {rule}
        </td>
      </tr>
      "#,
        id = id,
        url = encode_text(row.url.as_str()),
        impact = v.impact,
        description = encode_text(&v.description),
        nodes = encode_text(&v.nodes.join(",")),
        help = encode_text(&v.help),
        help_link = help_link(&v.help_url),
        rule = encode_text(&v.id),
    );
}

/// Renders the help URL, as a link only when it is an http(s) URL
fn help_link(help_url: &str) -> String {
    match Url::parse(help_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => format!(
            r#"<a href="{}" target="_blank">{}</a>"#,
            encode_double_quoted_attribute(help_url),
            encode_text(help_url)
        ),
        _ => encode_text(help_url).into_owned(),
    }
}

/// Renders a complete report document
///
/// Only the first placeholder occurrence is replaced.
///
/// # Returns
///
/// * `Ok(String)` - The HTML document
/// * `Err(ReportError::MissingPlaceholder)` - The template has no `{{TABLE_ROWS}}`
///
/// # Example
///
/// ```
/// use sumi_audit::report::{render_html, ReportModel, DEFAULT_TEMPLATE};
///
/// let html = render_html(&ReportModel::default(), DEFAULT_TEMPLATE).unwrap();
/// assert!(html.contains("<table>"));
/// ```
pub fn render_html(model: &ReportModel, template: &str) -> Result<String, ReportError> {
    if !template.contains(TABLE_ROWS_PLACEHOLDER) {
        return Err(ReportError::MissingPlaceholder("template".to_string()));
    }

    Ok(template.replacen(TABLE_ROWS_PLACEHOLDER, &render_rows(model), 1))
}

/// Renders the report and writes it to `path`
pub fn write_html_report(
    model: &ReportModel,
    template: &str,
    path: &Path,
) -> Result<(), ReportError> {
    let html = render_html(model, template)?;

    fs::write(path, html).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Report written to {} ({} rows)", path.display(), model.len());
    Ok(())
}
