use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::question::{default_difficulty, Question};
use crate::services::generator::QuestionGenerator;
use crate::utils::json::strip_code_fence;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use validator::Validate;

#[derive(Clone, Debug)]
pub struct LlmSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub exam_name: String,
    pub questions_per_batch: usize,
    pub shuffle_options: bool,
}

impl LlmSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.llm_api_url.clone(),
            api_key: config.llm_api_key.clone(),
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
            exam_name: config.exam_name.clone(),
            questions_per_batch: config.questions_per_batch,
            shuffle_options: config.shuffle_options,
        }
    }
}

/// Generation adapter over an Ollama or OpenAI style chat-completion endpoint.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    settings: LlmSettings,
}

impl AIService {
    pub fn new(settings: LlmSettings, client: Client) -> Self {
        Self { client, settings }
    }

    pub async fn generate_mcqs(&self, subject: &str) -> Result<Vec<Question>> {
        let count = self.settings.questions_per_batch;
        tracing::info!(subject, model = %self.settings.model, count, "Requesting MCQ batch");

        let payload = serde_json::json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": self.system_prompt()},
                {"role": "user", "content": format!(
                    "Generate exactly {} MCQs from the subject '{}'. \
                     Follow the JSON format strictly. Do not add any extra text.",
                    count, subject
                )}
            ],
            "stream": false
        });

        let raw_text = self.chat_completion(payload).await?;
        let questions = self.parse_questions(&raw_text, subject)?;
        tracing::info!(subject, received = questions.len(), "MCQ batch parsed");
        Ok(questions)
    }

    fn system_prompt(&self) -> String {
        format!(
            r#"You are an experienced examiner for the {exam} exam.
Your task is to write realistic multiple-choice practice questions in the style of the exam's previous papers.

Rules:
1. Generate exactly {count} questions per request.
2. Every question has exactly 4 options and exactly one correct answer.
3. "correct_option" is the zero-based index of the correct option. Vary its position across questions.
4. The explanation must be short, conceptual and must justify the option at "correct_option".
5. Difficulty is easy to moderate. No coding questions, no long numericals.
6. Output valid JSON only. No markdown, no commentary.

Output format:
{{
  "questions": [
    {{
      "question": "Question text",
      "options": ["Option A", "Option B", "Option C", "Option D"],
      "correct_option": 1,
      "explanation": "Why option B is correct.",
      "subject": "Subject name",
      "difficulty": "Easy"
    }}
  ]
}}

Before answering, check that every explanation agrees with its correct_option and fix the index if it does not."#,
            exam = self.settings.exam_name,
            count = self.settings.questions_per_batch,
        )
    }

    async fn chat_completion(&self, payload: JsonValue) -> Result<String> {
        let res = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .timeout(self.settings.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::Generation(format!("LLM API error {}: {}", status, text)));
        }

        let body: JsonValue = res.json().await?;
        Self::extract_content(&body)
    }

    /// Pulls the completion text out of the response shapes the supported
    /// providers use: Ollama chat, OpenAI chat, Ollama generate.
    pub fn extract_content(body: &JsonValue) -> Result<String> {
        let content = body
            .get("message")
            .and_then(|m| m.get("content"))
            .or_else(|| {
                body.get("choices")
                    .and_then(|c| c.get(0))
                    .and_then(|c| c.get("message"))
                    .and_then(|m| m.get("content"))
            })
            .or_else(|| body.get("response"))
            .and_then(|c| c.as_str());

        content
            .map(str::to_string)
            .ok_or_else(|| Error::Generation("Unable to extract LLM response".to_string()))
    }

    pub fn parse_questions(&self, raw_text: &str, subject: &str) -> Result<Vec<Question>> {
        let cleaned = strip_code_fence(raw_text);
        let parsed: JsonValue = serde_json::from_str(cleaned)?;
        self.sanitize_questions(&parsed, subject)
    }

    /// Keeps the well-formed entries of a `{"questions": [...]}` payload.
    ///
    /// Malformed entries are dropped; a payload with no usable entry is an error.
    pub fn sanitize_questions(&self, raw: &JsonValue, subject: &str) -> Result<Vec<Question>> {
        let items = raw
            .get("questions")
            .and_then(|q| q.as_array())
            .ok_or_else(|| Error::Generation("Invalid MCQ JSON structure".to_string()))?;

        let mut rng = rand::thread_rng();
        let mut questions = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match self.coerce_question(item, subject, &mut rng) {
                Ok(q) => questions.push(q),
                Err(e) => tracing::warn!(subject, index, error = %e, "Dropping malformed question"),
            }
        }

        if questions.is_empty() {
            return Err(Error::Generation(format!(
                "LLM returned no usable questions for '{}'",
                subject
            )));
        }
        Ok(questions)
    }

    fn coerce_question(&self, v: &JsonValue, subject: &str, rng: &mut impl rand::Rng) -> Result<Question> {
        let text_field = |key: &str| {
            v.get(key)
                .and_then(|s| s.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let options: Vec<String> = v
            .get("options")
            .and_then(|o| o.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|x| x.as_str().map(|s| s.trim().to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let correct_option = v
            .get("correct_option")
            .and_then(|i| {
                i.as_u64()
                    .or_else(|| i.as_str().and_then(|s| s.trim().parse().ok()))
            })
            .ok_or_else(|| Error::Generation("missing or invalid correct_option".to_string()))?
            as usize;

        let mut q = Question {
            question: text_field("question").unwrap_or_default(),
            options,
            correct_option,
            explanation: text_field("explanation").unwrap_or_default(),
            subject: text_field("subject").unwrap_or_else(|| subject.to_string()),
            difficulty: text_field("difficulty").unwrap_or_else(default_difficulty),
        };
        q.validate()?;

        if self.settings.shuffle_options {
            if let Some(correct_text) = q.correct_text().map(str::to_string) {
                q.options.shuffle(rng);
                q.correct_option = q
                    .options
                    .iter()
                    .position(|o| *o == correct_text)
                    .unwrap_or(0);
            }
        }

        Ok(q)
    }
}

#[async_trait]
impl QuestionGenerator for AIService {
    async fn generate(&self, topic: &str) -> Result<Vec<Question>> {
        self.generate_mcqs(topic).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(shuffle_options: bool) -> AIService {
        AIService::new(
            LlmSettings {
                api_url: "http://127.0.0.1:9/api/chat".into(),
                api_key: "test".into(),
                model: "test-model".into(),
                timeout: Duration::from_secs(5),
                exam_name: "Test Exam".into(),
                questions_per_batch: 10,
                shuffle_options,
            },
            Client::new(),
        )
    }

    fn mcq(text: &str, correct: i64) -> JsonValue {
        json!({
            "question": text,
            "options": ["FCFS", "SJF", "Round Robin", "Priority"],
            "correct_option": correct,
            "explanation": "Convoy effect happens with FCFS.",
            "subject": "Operating Systems",
            "difficulty": "Easy"
        })
    }

    #[test]
    fn extracts_content_from_each_provider_shape() {
        let ollama = json!({"message": {"role": "assistant", "content": "A"}});
        let openai = json!({"choices": [{"message": {"content": "B"}}]});
        let generate = json!({"response": "C"});

        assert_eq!(AIService::extract_content(&ollama).unwrap(), "A");
        assert_eq!(AIService::extract_content(&openai).unwrap(), "B");
        assert_eq!(AIService::extract_content(&generate).unwrap(), "C");
    }

    #[test]
    fn missing_content_is_a_generation_error() {
        let err = AIService::extract_content(&json!({"done": true})).unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }

    #[test]
    fn drops_malformed_entries_and_keeps_order() {
        let svc = service(false);
        let raw = json!({
            "questions": [
                mcq("first", 0),
                {"question": "three options", "options": ["a", "b", "c"], "correct_option": 0},
                mcq("out of range", 7),
                {"question": "", "options": ["a", "b", "c", "d"], "correct_option": 1},
                mcq("second", 2)
            ]
        });

        let questions = svc.sanitize_questions(&raw, "Operating Systems").unwrap();

        let texts: Vec<&str> = questions.iter().map(|q| q.question.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(questions[1].correct_option, 2);
    }

    #[test]
    fn fills_defaults_for_optional_fields() {
        let svc = service(false);
        let raw = json!({
            "questions": [{
                "question": "Which normal form removes transitive dependency?",
                "options": ["1NF", "2NF", "3NF", "4NF"],
                "correct_option": "2"
            }]
        });

        let questions = svc.sanitize_questions(&raw, "DBMS").unwrap();

        assert_eq!(questions[0].subject, "DBMS");
        assert_eq!(questions[0].difficulty, "Moderate");
        assert_eq!(questions[0].explanation, "");
        assert_eq!(questions[0].correct_option, 2);
    }

    #[test]
    fn shuffling_keeps_the_correct_answer_text() {
        let svc = service(true);
        let raw = json!({ "questions": (0..20).map(|i| mcq(&format!("q{}", i), 0)).collect::<Vec<_>>() });

        let questions = svc.sanitize_questions(&raw, "Operating Systems").unwrap();

        assert_eq!(questions.len(), 20);
        for q in &questions {
            assert_eq!(q.correct_text(), Some("FCFS"));
            assert_eq!(q.options.len(), 4);
        }
    }

    #[test]
    fn rejects_payload_without_questions_array() {
        let svc = service(false);
        for raw in [json!([mcq("q", 0)]), json!({"questions": "none"}), json!({"items": []})] {
            let err = svc.sanitize_questions(&raw, "DBMS").unwrap_err();
            assert!(matches!(err, Error::Generation(ref m) if m == "Invalid MCQ JSON structure"));
        }
    }

    #[test]
    fn rejects_payload_with_no_usable_question() {
        let svc = service(false);
        let raw = json!({"questions": [{"question": "x"}]});
        assert!(matches!(
            svc.sanitize_questions(&raw, "DBMS"),
            Err(Error::Generation(_))
        ));
    }

    #[test]
    fn parses_fenced_model_output() {
        let svc = service(false);
        let text = format!("```json\n{}\n```", json!({"questions": [mcq("fenced", 3)]}));

        let questions = svc.parse_questions(&text, "Operating Systems").unwrap();

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_text(), Some("Priority"));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let svc = service(false);
        assert!(matches!(
            svc.parse_questions("{\"questions\": [", "DBMS"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn system_prompt_mentions_exam_and_batch_size() {
        let prompt = service(false).system_prompt();
        assert!(prompt.contains("Test Exam"));
        assert!(prompt.contains("exactly 10 questions"));
        assert!(prompt.contains("\"correct_option\": 1"));
    }
}
