//! Shared request, response, and domain types

pub mod question;
pub mod request;
pub mod response;

pub use question::Question;
pub use request::{ChatRequest, GenerateQuizRequest, Persona, ProviderConfig, SavePromptRequest};
pub use response::{
    ChatResponse, GenerateResponse, PromptContentResponse, SavePromptResponse, UploadResponse,
    UploadedPdf,
};
