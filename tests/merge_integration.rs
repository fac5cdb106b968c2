//! Integration tests for the merge stage
//!
//! These tests run the merge pipeline end to end against CSV fixtures on
//! disk, the way the `merge` command does.

use dataset_loader::cli::merge_datasets;
use dataset_loader::config::MergeConfig;
use dataset_loader::storage::CsvReader;
use dataset_loader::table::Value;
use dataset_loader::transform::{JoinPolicy, MergeError};
use eyre::Result;
use std::path::Path;
use tempfile::TempDir;

const TRAIN: &str = "\
PassengerId,Survived,Pclass,Name,Sex,Age,Ticket,Fare,Cabin,Embarked
1,0,3,\"Braund, Mr. Owen Harris\",male,22,A/5 21171,7.25,,S
2,1,1,\"Cumings, Mrs. John Bradley (Florence Briggs Thayer)\",female,38,PC 17599,71.2833,C85,C
3,1,3,\"Heikkinen, Miss. Laina\",female,26,STON/O2. 3101282,7.925,,S
";

const TEST: &str = "\
PassengerId,Pclass,Name,Sex,Age,Ticket,Fare,Cabin,Embarked
892,3,\"Kelly, Mr. James\",male,34.5,330911,7.8292,,Q
893,3,\"Wilkes, Mrs. James (Ellen Needs)\",female,47,363272,7,,S
894,2,\"Myles, Mr. Thomas Francis\",male,62,240276,,,Q
";

const LABELS: &str = "\
PassengerId,Survived
894,0
892,0
893,1
";

struct Fixture {
    _dir: TempDir,
    config: MergeConfig,
}

fn fixture(train: &str, test: &str, labels: &str) -> Result<Fixture> {
    let dir = TempDir::new()?;
    let write = |name: &str, content: &str| -> Result<std::path::PathBuf> {
        let path = dir.path().join(name);
        std::fs::write(&path, content)?;
        Ok(path)
    };

    let config = MergeConfig {
        training: write("train.csv", train)?,
        unlabeled: write("test.csv", test)?,
        labels: write("gender_submission.csv", labels)?,
        output: dir.path().join("out").join("titanic_data.csv"),
        join_key: "PassengerId".to_string(),
        join_policy: JoinPolicy::Strict,
    };
    Ok(Fixture { _dir: dir, config })
}

fn header(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().next().unwrap_or_default().to_string())
}

#[tokio::test]
async fn test_merge_writes_combined_file() -> Result<()> {
    let fixture = fixture(TRAIN, TEST, LABELS)?;
    let config = &fixture.config;

    let combined = merge_datasets(config).await?;

    assert_eq!(combined.len(), 6, "3 training rows + 3 labeled test rows");
    assert_eq!(header(&config.output)?, header(&config.training)?);

    // Labels are aligned by key, not by position
    assert_eq!(combined.get(5, "PassengerId"), Some(&Value::Integer(894)));
    assert_eq!(combined.get(5, "Survived"), Some(&Value::Integer(0)));
    assert_eq!(combined.get(4, "Survived"), Some(&Value::Integer(1)));

    // Age mixes integers and floats across files
    assert_eq!(combined.get(0, "Age"), Some(&Value::Float(22.0)));
    assert_eq!(combined.get(3, "Age"), Some(&Value::Float(34.5)));
    assert_eq!(combined.get(5, "Fare"), Some(&Value::Null));

    // Ticket is text in both files
    assert_eq!(combined.get(3, "Ticket"), Some(&Value::from("330911")));

    Ok(())
}

#[tokio::test]
async fn test_combined_file_reads_back_unchanged() -> Result<()> {
    let fixture = fixture(TRAIN, TEST, LABELS)?;

    let combined = merge_datasets(&fixture.config).await?;
    let read_back = CsvReader::new(&fixture.config.output).read()?;

    assert_eq!(read_back, combined);
    Ok(())
}

#[tokio::test]
async fn test_merge_twice_is_identical() -> Result<()> {
    let fixture = fixture(TRAIN, TEST, LABELS)?;

    let first = merge_datasets(&fixture.config).await?;
    let first_bytes = std::fs::read(&fixture.config.output)?;
    let second = merge_datasets(&fixture.config).await?;
    let second_bytes = std::fs::read(&fixture.config.output)?;

    assert_eq!(first, second);
    assert_eq!(first_bytes, second_bytes);
    Ok(())
}

#[tokio::test]
async fn test_unlabeled_passenger_fails_merge() -> Result<()> {
    let labels = "PassengerId,Survived\n892,0\n893,1\n";
    let fixture = fixture(TRAIN, TEST, labels)?;

    let err = merge_datasets(&fixture.config).await.unwrap_err();
    let merge_error = err
        .downcast_ref::<MergeError>()
        .expect("merge error in the chain");
    assert_eq!(
        merge_error,
        &MergeError::JoinIntegrity {
            row: 2,
            key: Value::Integer(894),
            matches: 0
        }
    );
    assert!(
        !fixture.config.output.exists(),
        "Nothing should be written when the merge fails"
    );
    Ok(())
}

#[tokio::test]
async fn test_inner_policy_drops_unlabeled_passenger() -> Result<()> {
    let labels = "PassengerId,Survived\n892,0\n893,1\n";
    let mut fixture = fixture(TRAIN, TEST, labels)?;
    fixture.config.join_policy = JoinPolicy::Inner;

    let combined = merge_datasets(&fixture.config).await?;

    assert_eq!(combined.len(), 5);
    let ids: Vec<Value> = combined.column("PassengerId").unwrap().cloned().collect();
    assert!(!ids.contains(&Value::Integer(894)));
    Ok(())
}

#[tokio::test]
async fn test_missing_input_names_the_file() -> Result<()> {
    let mut fixture = fixture(TRAIN, TEST, LABELS)?;
    fixture.config.labels = fixture.config.labels.with_file_name("missing.csv");

    let err = merge_datasets(&fixture.config).await.unwrap_err();
    let report = format!("{:?}", err);
    assert!(report.contains("labels"), "{}", report);
    assert!(report.contains("missing.csv"), "{}", report);
    Ok(())
}
