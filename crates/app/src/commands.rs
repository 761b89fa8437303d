use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use services::{AppServices, ProgressService, QuestionBankService, sample};
use study_core::model::question::{format_question_number, search};
use study_core::model::{AnswerStatus, OptionIndex, Outcome, Question, QuestionId, Subject};

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Progress,
    Answer {
        subject: Subject,
        question: QuestionId,
        selected: OptionIndex,
    },
    List {
        subject: Subject,
        status: AnswerStatus,
    },
    Stats {
        subject: Subject,
    },
    Search {
        subject: Subject,
        term: String,
    },
    Sample {
        subject: Subject,
        count: usize,
    },
    Quiz(QuizAction),
    Export {
        out: Option<PathBuf>,
    },
    Import {
        path: PathBuf,
    },
    Reset {
        subject: Option<Subject>,
    },
    Reconcile {
        check_only: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizAction {
    Start(Subject),
    Show,
    Next,
    Previous,
    GoTo(QuestionId),
}

#[derive(Debug)]
enum CommandError {
    UnknownQuestion { subject: Subject, question: QuestionId },
    NoQuiz,
    ImportRejected { path: PathBuf },
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownQuestion { subject, question } => {
                write!(f, "{subject} has no question {question}")
            }
            CommandError::NoQuiz => write!(f, "no quiz in progress; run `quiz start <subject>`"),
            CommandError::ImportRejected { path } => {
                write!(f, "{} is not a valid progress export", path.display())
            }
        }
    }
}

impl Error for CommandError {}

pub async fn execute(command: Command, app: &AppServices) -> Result<(), Box<dyn Error>> {
    let progress = app.progress();
    let bank = app.question_bank();

    match command {
        Command::Help => {}
        Command::Progress => print_progress(&progress).await?,
        Command::Answer {
            subject,
            question,
            selected,
        } => {
            let questions = bank.load(&subject).await?;
            let found = find_question(&questions, &subject, question)?;
            let is_correct = found.is_correct(selected);
            progress
                .record_answer(&subject, question, selected, is_correct)
                .await?;
            let verdict = if is_correct { "correct" } else { "incorrect" };
            println!(
                "{subject} {}: {selected} is {verdict} (answer {})",
                number(question, questions.len()),
                OptionIndex::new(found.correct_answer).map_or('?', OptionIndex::letter)
            );
            if !found.explanation.is_empty() {
                println!("  {}", found.explanation);
            }
        }
        Command::List { subject, status } => {
            let ids: Vec<QuestionId> = match status {
                AnswerStatus::Answered => {
                    progress.list_answers(&subject).await?.into_keys().collect()
                }
                AnswerStatus::Unanswered => {
                    let total = progress.catalog().questions_per_subject();
                    progress.list_unanswered(&subject, total).await?
                }
                AnswerStatus::Correct => {
                    progress.list_by_outcome(&subject, Outcome::Correct).await?
                }
                AnswerStatus::Incorrect => {
                    progress.list_by_outcome(&subject, Outcome::Incorrect).await?
                }
            };
            let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
            println!("{} ({}): {}", subject, ids.len(), rendered.join(", "));
        }
        Command::Stats { subject } => {
            let questions = bank.load(&subject).await?;
            let stats = progress.question_stats(&subject, &questions).await?;
            let info = progress.catalog().info(&subject);
            println!("{} {}", info.icon, info.name);
            println!(
                "  answered   {}/{} ({}%)",
                stats.answered, stats.total, stats.completion
            );
            println!("  correct    {}", stats.correct);
            println!("  incorrect  {}", stats.incorrect);
            println!("  unanswered {}", stats.unanswered);
            println!("  accuracy   {}%", stats.accuracy);
        }
        Command::Search { subject, term } => {
            let questions = bank.load(&subject).await?;
            for question in search(&questions, &term) {
                println!(
                    "{} {}",
                    number(question.id, questions.len()),
                    question.question
                );
            }
        }
        Command::Sample { subject, count } => {
            let questions = bank.load(&subject).await?;
            for question in sample(&questions, count) {
                println!(
                    "{} {}",
                    number(question.id, questions.len()),
                    question.question
                );
            }
        }
        Command::Quiz(action) => run_quiz(action, &progress, &bank).await?,
        Command::Export { out } => {
            let json = progress.export_json().await?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    println!("exported progress to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Import { path } => {
            let raw = tokio::fs::read_to_string(&path).await?;
            if !progress.import_all(&raw).await? {
                return Err(CommandError::ImportRejected { path }.into());
            }
            println!("imported progress from {}", path.display());
        }
        Command::Reset { subject } => match subject {
            Some(subject) => {
                progress.reset_subject(&subject).await?;
                println!("reset {subject}");
            }
            None => {
                progress.reset_all().await?;
                println!("reset all subjects");
            }
        },
        Command::Reconcile { check_only } => {
            let drift = if check_only {
                progress.check_counters().await?
            } else {
                progress.reconcile().await?
            };
            if drift.is_empty() {
                println!("counters match the answer ledger");
            }
            for entry in drift {
                println!(
                    "{}: stored {}/{} replayed {}/{}",
                    entry.subject,
                    entry.stored.correct(),
                    entry.stored.answered(),
                    entry.replayed.correct(),
                    entry.replayed.answered()
                );
            }
        }
    }
    Ok(())
}

async fn print_progress(progress: &ProgressService) -> Result<(), Box<dyn Error>> {
    let catalog = progress.catalog();
    let book = progress.progress_book().await?;
    for info in catalog.entries() {
        let counters = book.get(&info.subject);
        println!(
            "{} {:<36} {:>3}/{} answered, {}% correct",
            info.icon,
            info.name,
            counters.answered(),
            catalog.questions_per_subject(),
            counters.accuracy_percent()
        );
    }

    let overall = progress.overall_progress().await?;
    println!(
        "Overall: {}/{} answered, {}% correct",
        overall.answered, overall.total, overall.percentage
    );
    Ok(())
}

async fn run_quiz(
    action: QuizAction,
    progress: &ProgressService,
    bank: &QuestionBankService,
) -> Result<(), Box<dyn Error>> {
    let position = match &action {
        QuizAction::Start(subject) => Some(progress.start_quiz(subject).await?),
        QuizAction::Show => progress.current_position().await?,
        QuizAction::GoTo(question) => {
            let current = progress
                .current_position()
                .await?
                .ok_or(CommandError::NoQuiz)?;
            let questions = bank.load(&current.subject).await?;
            find_question(&questions, &current.subject, *question)?;
            progress.go_to(*question).await?
        }
        QuizAction::Next | QuizAction::Previous => {
            let current = progress
                .current_position()
                .await?
                .ok_or(CommandError::NoQuiz)?;
            let moved = if action == QuizAction::Next {
                let questions = bank.load(&current.subject).await?;
                let bank_len = u32::try_from(questions.len()).unwrap_or(u32::MAX);
                progress.next_question(bank_len).await?
            } else {
                progress.previous_question().await?
            };
            if moved.is_none() {
                let end = if action == QuizAction::Next { "last" } else { "first" };
                println!("already at the {end} question");
            }
            Some(moved.unwrap_or(current))
        }
    };

    let position = position.ok_or(CommandError::NoQuiz)?;
    let questions = bank.load(&position.subject).await?;
    let question = find_question(&questions, &position.subject, position.question)?;

    println!(
        "{} question {} of {}",
        progress.catalog().info(&position.subject).name,
        number(question.id, questions.len()),
        questions.len()
    );
    if let Some(passage) = &question.passage {
        println!("\n{}\n", passage.content);
    }
    println!("{}", question.question);
    let saved = progress
        .get_answer(&position.subject, position.question)
        .await?;
    for (index, text) in question.options.iter().enumerate() {
        let marker = match &saved {
            Some(record) if usize::from(record.selected.value()) == index => "*",
            _ => " ",
        };
        let letter = u8::try_from(index)
            .ok()
            .and_then(|i| OptionIndex::new(i).ok())
            .map_or('?', OptionIndex::letter);
        println!(" {marker} {letter}) {text}");
    }
    Ok(())
}

fn find_question<'a>(
    questions: &'a [Question],
    subject: &Subject,
    question: QuestionId,
) -> Result<&'a Question, CommandError> {
    questions
        .iter()
        .find(|candidate| candidate.id == question)
        .ok_or_else(|| CommandError::UnknownQuestion {
            subject: subject.clone(),
            question,
        })
}

fn number(question: QuestionId, bank_len: usize) -> String {
    let total = u32::try_from(bank_len).unwrap_or(u32::MAX);
    format_question_number(question.value(), total)
}
