use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use services::{AppServices, BankSource, Clock, ServiceOptions};
use study_core::model::{OptionIndex, Outcome, ProgressBook, QuestionId, Subject};
use study_core::time::fixed_now;

fn subject(key: &str) -> Subject {
    Subject::new(key).expect("subject")
}

fn qid(id: u32) -> QuestionId {
    QuestionId::new(id).expect("question id")
}

fn option(index: u8) -> OptionIndex {
    OptionIndex::new(index).expect("option")
}

fn options(namespace: &str) -> ServiceOptions {
    ServiceOptions {
        namespace: Some(namespace.to_string()),
        ..ServiceOptions::default()
    }
}

#[tokio::test]
async fn sqlite_progress_flow_survives_reopen() {
    let url = "sqlite:file:memdb_progress_flow?mode=memory&cache=shared";
    let clock = Clock::fixed(fixed_now());
    let bank = BankSource::parse("data");

    let app = AppServices::new_sqlite(url, bank.clone(), options("ged"), clock)
        .await
        .expect("open services");
    let progress = app.progress();
    let math = subject("math");

    progress
        .record_answer(&math, qid(1), option(2), true)
        .await
        .expect("first answer");
    progress
        .record_answer(&math, qid(1), option(1), false)
        .await
        .expect("regressed answer");
    progress
        .record_answer(&math, qid(2), option(0), true)
        .await
        .expect("second question");

    let reopened = AppServices::new_sqlite(url, bank, options("ged"), clock)
        .await
        .expect("reopen services");
    let progress = reopened.progress();

    let counters = progress.subject_progress(&math).await.expect("counters");
    assert_eq!((counters.answered(), counters.correct()), (2, 1));
    assert_eq!(
        progress
            .list_by_outcome(&math, Outcome::Incorrect)
            .await
            .expect("incorrect"),
        vec![qid(1)]
    );
    let answer = progress
        .get_answer(&math, qid(1))
        .await
        .expect("read")
        .expect("answer stored");
    assert_eq!(answer.selected, option(1));
    assert_eq!(answer.recorded_at, fixed_now());

    let overall = progress.overall_progress().await.expect("overall");
    assert_eq!((overall.answered, overall.correct, overall.percentage), (2, 1, 50));
    assert!(progress.check_counters().await.expect("check").is_empty());
}

#[tokio::test]
async fn namespaces_keep_deployments_apart() {
    let url = "sqlite:file:memdb_namespaces?mode=memory&cache=shared";
    let clock = Clock::fixed(fixed_now());
    let bank = BankSource::parse("data");

    let ged = AppServices::new_sqlite(url, bank.clone(), options("ged"), clock)
        .await
        .expect("ged services");
    let hiset = AppServices::new_sqlite(url, bank, options("hiset"), clock)
        .await
        .expect("hiset services");

    ged.progress()
        .record_answer(&subject("science"), qid(3), option(3), true)
        .await
        .expect("answer");

    let other = hiset
        .progress()
        .subject_progress(&subject("science"))
        .await
        .expect("counters");
    assert_eq!(other.answered(), 0);
}

#[tokio::test]
async fn random_answer_sequences_match_ledger_replay() {
    let app = AppServices::in_memory(
        BankSource::parse("data"),
        ServiceOptions::default(),
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("open services");
    let progress = app.progress();
    let subjects = ["math", "rla", "science", "social"].map(subject);
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for _ in 0..300 {
        let subject = &subjects[rng.random_range(0..subjects.len())];
        let question = qid(rng.random_range(1..=12));
        let selected = option(rng.random_range(0..4));
        let is_correct = rng.random_bool(0.5);
        progress
            .record_answer(subject, question, selected, is_correct)
            .await
            .expect("record");

        if rng.random_ratio(1, 40) {
            progress.reset_subject(subject).await.expect("reset");
        }
    }

    let exported = progress.export_all().await.expect("export");
    let replayed = ProgressBook::replay(&exported.answers, progress.catalog());
    assert_eq!(exported.progress, replayed);
    assert!(progress.check_counters().await.expect("check").is_empty());

    for subject in &subjects {
        let counters = progress.subject_progress(subject).await.expect("counters");
        let answers = progress.list_answers(subject).await.expect("answers");
        assert_eq!(counters.answered() as usize, answers.len());
        let correct = progress
            .list_by_outcome(subject, Outcome::Correct)
            .await
            .expect("correct");
        assert_eq!(counters.correct() as usize, correct.len());
    }
}

#[tokio::test]
async fn import_of_inconsistent_counters_is_rebuilt_from_answers() {
    let app = AppServices::in_memory(
        BankSource::parse("data"),
        ServiceOptions::default(),
        Clock::fixed(fixed_now()),
    )
    .await
    .expect("open services");
    let progress = app.progress();

    let raw = r#"{
        "answers": {
            "social": {
                "1": {"selectedAnswer": 0, "isCorrect": true, "timestamp": "2025-03-01T10:00:00Z"},
                "2": {"selectedAnswer": 3, "isCorrect": false, "timestamp": "2025-03-01T10:01:00Z"}
            }
        },
        "progress": {"social": {"answered": 9, "correct": 0}},
        "exportDate": "2025-03-01T10:05:00Z"
    }"#;
    assert!(progress.import_all(raw).await.expect("import"));

    let social = progress
        .subject_progress(&subject("social"))
        .await
        .expect("counters");
    assert_eq!((social.answered(), social.correct()), (2, 1));
    assert!(progress.reconcile().await.expect("reconcile").is_empty());

    progress
        .record_answer(&subject("social"), qid(1), option(2), false)
        .await
        .expect("regress");
    let social = progress
        .subject_progress(&subject("social"))
        .await
        .expect("counters");
    assert_eq!((social.answered(), social.correct()), (2, 0));
}
