use crate::{error::ResultsError, model::TaskSubmissions};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Responses keyed by the item id the task interface echoed back
pub type ExtractedResults = BTreeMap<String, Vec<Value>>;

#[derive(Deserialize)]
struct Answer {
  #[serde(rename = "globalID")]
  global_id: Value,
  results: Value,
}

fn item_key(global_id: Value) -> String {
  match global_id {
    Value::String(id) => id,
    other => other.to_string(),
  }
}

/// Group every submitted answer's `results` under its `globalID`. Submissions without an answer are
/// skipped
pub fn extract_responses(
  task_submissions: &[TaskSubmissions],
) -> Result<ExtractedResults, ResultsError> {
  let mut results = ExtractedResults::new();

  for submission in task_submissions.iter().flat_map(|task| &task.submissions) {
    let raw = match submission.answer.as_deref().map(str::trim) {
      Some(raw) if !raw.is_empty() => raw,
      _ => {
        debug!("submission {} carries no answer", submission.id);
        continue;
      }
    };

    let answer: Answer =
      serde_json::from_str(raw).map_err(|err| ResultsError::MalformedAnswer {
        submission: submission.id.clone(),
        reason: err.to_string(),
      })?;

    results
      .entry(item_key(answer.global_id))
      .or_default()
      .push(answer.results);
  }

  Ok(results)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{Submission, SubmissionStatus};
  use serde_json::json;

  fn submission(id: &str, answer: Option<&str>) -> Submission {
    Submission {
      id: id.to_string(),
      task_id: String::from("T1"),
      worker_id: String::from("W1"),
      status: SubmissionStatus::Submitted,
      answer: answer.map(String::from),
      submitted_at: None,
    }
  }

  #[test]
  fn it_groups_answers_by_item() -> Result<(), ResultsError> {
    let submissions = vec![TaskSubmissions {
      task_id: String::from("T1"),
      submissions: vec![
        submission("A1", Some(r#"{"globalID": "img-7", "results": {"label": "stop"}}"#)),
        submission("A2", Some(r#"{"globalID": "img-7", "results": {"label": "yield"}}"#)),
        submission("A3", Some(r#"{"globalID": 12, "results": [1, 2]}"#)),
        submission("A4", None),
        submission("A5", Some("  ")),
      ],
    }];

    let results = extract_responses(&submissions)?;

    assert_eq!(results.len(), 2);
    assert_eq!(
      results["img-7"],
      vec![json!({"label": "stop"}), json!({"label": "yield"})]
    );
    assert_eq!(results["12"], vec![json!([1, 2])]);

    Ok(())
  }

  #[test]
  fn it_names_malformed_submissions() {
    let submissions = vec![TaskSubmissions {
      task_id: String::from("T1"),
      submissions: vec![submission("A9", Some("{\"results\": 1}"))],
    }];

    let err = extract_responses(&submissions).unwrap_err();

    assert!(matches!(err, ResultsError::MalformedAnswer { submission, .. } if submission == "A9"));
  }
}
