use serde::{Deserialize, Serialize};

pub const INVOICE_CONTENT_TYPE: &str = "application/pdf";

/// A downloaded invoice, always typed as a PDF.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDocument {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl InvoiceDocument {
    pub fn pdf(transfer_id: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: invoice_file_name(transfer_id),
            content_type: INVOICE_CONTENT_TYPE.to_string(),
            bytes,
        }
    }
}

pub fn invoice_file_name(transfer_id: &str) -> String {
    format!("TrustBridge-Invoice-{transfer_id}.pdf")
}
