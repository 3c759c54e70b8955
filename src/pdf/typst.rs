use serde::Serialize;
use std::path::Path;
use std::process::Command;

use crate::error::{InnoventoryError, Result};
use crate::export::TablePdfData;

/// Embedded Typst template for table exports
/// Uses a placeholder that gets replaced with the actual JSON file path
const TABLE_TEMPLATE: &str = r##"// Table export
// Data is loaded from JSON file

#let data = json("DATA_JSON_PATH")

#set page(
  paper: "a4",
  flipped: true,
  margin: (top: 0.6in, bottom: 0.6in, left: 0.5in, right: 0.5in),
  footer: context align(right, text(size: 8pt, fill: gray)[
    #counter(page).display("1 / 1", both: true)
  ]),
)

#set text(font: "Helvetica", size: 9pt)

#grid(
  columns: (1fr, 1fr),
  align: (left, right),
  [
    #text(size: 16pt, weight: "bold")[#data.title]
    #v(0.2em)
    #data.company
  ],
  [
    Generated #data.generated \
    #text(fill: gray)[#data.summary]
  ]
)

#v(0.8em)
#line(length: 100%, stroke: 0.5pt + gray)
#v(0.8em)

#table(
  columns: data.headers.len(),
  align: left,
  stroke: (x, y) => if y == 0 { (bottom: 1pt + black) } else if y > 0 { (bottom: 0.5pt + gray) },
  inset: 6pt,
  fill: (x, y) => if y == 0 { luma(240) } else { none },

  ..data.headers.map(h => [*#h*]),
  ..data.rows.flatten()
)
"##;

/// Render `data` into `template` and compile it to `output_path` with the Typst CLI
fn compile<T: Serialize>(template: &str, data: &T, stem: &str, output_path: &Path) -> Result<()> {
    if Command::new("typst").arg("--version").output().is_err() {
        return Err(InnoventoryError::TypstNotFound);
    }

    let temp_dir = std::env::temp_dir().join("innoventory-pdf");
    std::fs::create_dir_all(&temp_dir)?;

    let json_data =
        serde_json::to_string(data).map_err(|e| InnoventoryError::PdfGeneration(e.to_string()))?;
    let json_name = format!("{stem}_data.json");
    let json_path = temp_dir.join(&json_name);
    std::fs::write(&json_path, &json_data)?;

    let template_path = temp_dir.join(format!("{stem}.typ"));
    std::fs::write(&template_path, template.replace("DATA_JSON_PATH", &json_name))?;

    let output = Command::new("typst")
        .arg("compile")
        .arg("--root")
        .arg(&temp_dir)
        .arg(&template_path)
        .arg(output_path)
        .output()?;

    let _ = std::fs::remove_file(&template_path);
    let _ = std::fs::remove_file(&json_path);

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(InnoventoryError::PdfGeneration(stderr.to_string()));
    }

    Ok(())
}

/// Generate a table PDF using Typst CLI
pub fn generate_table_pdf(data: &TablePdfData, output_path: &Path) -> Result<()> {
    tracing::debug!(rows = data.rows.len(), "compiling table pdf");
    compile(TABLE_TEMPLATE, data, "table", output_path)
}
