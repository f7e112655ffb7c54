pub mod attempt_dto;
pub mod question_dto;
