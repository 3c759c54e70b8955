mod typst;

pub use typst::generate_table_pdf;
