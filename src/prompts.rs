//! Prompts for document classification and entity extraction.
//!
//! The instruction template is a contract with the model: it fixes the
//! document taxonomy and asks for a flat JSON object with lowercase,
//! underscore-separated English keys. Nothing downstream enforces that
//! contract; the validator only checks that the reply parses as JSON and the
//! flattener copes with whatever nesting the model returns anyway.
//!
//! Callers can override the system message via
//! [`crate::config::PipelineConfig::system_prompt`]; the extraction template
//! itself is fixed.

/// Default system message for the extraction call.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant extracting entities from text to JSON.";

/// Instruction template. The document text is appended after the final
/// `Input Text:` line by [`extraction_prompt`].
pub const EXTRACTION_TEMPLATE: &str = r#"You are a document classification and entity extraction assistant. Process the input text, classify the type of document, and extract information based on that classification. Follow these instructions strictly. Do not limit yourself to the entities listed below: return every relevant entity you can find.

1. DOCUMENT CLASSIFICATION
   Identify the type of document. Possible types:
   - Bill/Invoice
   - Identity Document
   - Result/Grade Sheet
   - Other (if none of the above apply)

2. ENTITY EXTRACTION
   Extract the entities relevant to the identified type.
   The response must be a flat JSON object with no nested objects or arrays.

   For Bill/Invoice:
   - document_type: "Bill/Invoice"
   - sender: organization or person issuing the bill
   - receiver: name of the recipient
   - invoice_number: unique identifier of the invoice
   - invoice_date: date of the invoice
   - due_date: payment due date
   - total_amount: total amount on the invoice
   - currency: currency of the transaction
   - billing_address: address where the bill is issued
   - shipping_address: address for delivery
   - payment_method: method of payment (if available)

   For Identity Document:
   - document_type: "Identity Document"
   - name: name of the person
   - id_number: unique identification number
   - date_of_birth: date of birth
   - issue_date: date of issue
   - expiry_date: expiry date
   - address: address of the person (if available)
   - nationality: nationality (if mentioned)

   For Result/Grade Sheet:
   - document_type: "Result/Grade Sheet"
   - student_name: name of the student
   - roll_number: unique identifier of the student
   - exam_name: name of the exam
   - date_of_issue: date the result was issued
   - subjects: comma-separated list of subjects
   - grades: comma-separated grades matching the subjects
   - overall_result: Pass/Fail or other summary

   For Other documents:
   - document_type: "Other"
   - any relevant details such as document_title, issue_date, or identifiers

3. FORMATTING REQUIREMENTS
   - Return valid JSON only, starting and ending with braces. Do not wrap it in ```json fences.
   - Do not use nested structures or arrays.
   - All keys are lowercase English words separated by underscores.
   - Do not stop at the keys above; gather as much information as you can.

Input Text:
"#;

/// Build the user message for one document.
pub fn extraction_prompt(text: &str) -> String {
    let mut prompt = String::with_capacity(EXTRACTION_TEMPLATE.len() + text.len() + 1);
    prompt.push_str(EXTRACTION_TEMPLATE);
    prompt.push_str(text);
    prompt.push('\n');
    prompt
}
