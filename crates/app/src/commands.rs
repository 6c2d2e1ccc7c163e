use chrono::{Datelike, Local, NaiveDate};
use ledger::{
    ChangeCause, CompletionTracker, FamilyPreview, Filter, JoinMode, JoinOutcome, Ledger,
    NewTransaction, RemoteStore, Row, StoreError, Table, Transaction, TransactionPatch,
    TransactionStatus, parse_transcript,
};

use crate::{
    cli::{
        Command, FamilyCommand, MonthArgs, ProfileCommand, TxAddArgs, TxCommand, TxEditArgs,
        YearArgs,
    },
    error::{AppError, Result},
};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub async fn run<S: RemoteStore>(ledger: &mut Ledger<S>, command: Command) -> Result<()> {
    match command {
        Command::Profile(profile) => match profile.command {
            ProfileCommand::Set { name, email } => set_profile(ledger, name, email).await,
        },
        Command::Family(family) => {
            ledger.fetch_snapshot().await?;
            run_family(ledger, family.command).await
        }
        Command::Tx(tx) => {
            ledger.fetch_snapshot().await?;
            run_tx(ledger, tx.command).await
        }
        Command::Month(args) => {
            ledger.fetch_snapshot().await?;
            print_month(ledger, args);
            Ok(())
        }
        Command::Year(args) => {
            ledger.fetch_snapshot().await?;
            print_year(ledger, args);
            Ok(())
        }
    }
}

/// Stands in for the external auth system, which owns the `profiles` table.
async fn set_profile<S: RemoteStore>(
    ledger: &Ledger<S>,
    name: String,
    email: Option<String>,
) -> Result<()> {
    let mut row = Row::new();
    row.insert("display_name".to_string(), name.into());
    row.insert("email".to_string(), email.into());

    let store = ledger.store();
    let filter = Filter::new().eq("id", ledger.profile_id());
    if store.update(Table::Profiles, &filter, row.clone()).await? == 0 {
        row.insert("id".to_string(), ledger.profile_id().into());
        match store.insert(Table::Profiles, row).await {
            Ok(_) | Err(StoreError::Conflict(_)) => {}
            Err(err) => return Err(err.into()),
        }
    }
    println!("profile saved: {}", ledger.profile_id());
    Ok(())
}

async fn run_family<S: RemoteStore>(ledger: &mut Ledger<S>, command: FamilyCommand) -> Result<()> {
    match command {
        FamilyCommand::Show => {
            let snapshot = ledger.snapshot();
            let Some(family) = &snapshot.family else {
                println!("no family yet: create one or join with an invite code");
                return Ok(());
            };
            println!("{} (invite code {})", family.name, family.invite_code);
            for member in &snapshot.members {
                println!(
                    "  {:<8} {} <{}> [{}]",
                    member.role.as_str(),
                    member.display_name,
                    member.email,
                    member.profile_id
                );
            }
        }
        FamilyCommand::Create { name } => {
            let family = ledger.create_family(&name).await?;
            println!("created family: {} (invite code {})", family.name, family.invite_code);
        }
        FamilyCommand::Preview { code } => {
            let preview = ledger.preview_by_code(&code).await?;
            print_preview(&preview);
        }
        FamilyCommand::Join { code, direct } => {
            let mode = if direct {
                JoinMode::Direct
            } else {
                JoinMode::Preview
            };
            match ledger.join(&code, mode).await? {
                JoinOutcome::Previewed(preview) => {
                    print_preview(&preview);
                    println!("run `familyflow family confirm {}` to join", preview.id);
                }
                JoinOutcome::Joined(preview) => println!("joined family: {}", preview.name),
            }
        }
        FamilyCommand::Confirm { family_id } => {
            ledger.confirm_join(&family_id).await?;
            println!(
                "joined family: {}",
                ledger.snapshot().family_name().unwrap_or(&family_id)
            );
        }
        FamilyCommand::Rename { name } => {
            ledger.update_family_name(&name).await?;
            println!("family renamed: {name}");
        }
        FamilyCommand::Leave => {
            ledger.leave_family().await?;
            println!("left the family");
        }
        FamilyCommand::RemoveMember { profile_id } => {
            ledger.remove_member(&profile_id).await?;
            println!("removed member: {profile_id}");
        }
    }
    Ok(())
}

fn print_preview(preview: &FamilyPreview) {
    println!("{} [{}]", preview.name, preview.id);
    for member in &preview.members {
        println!("  {}", member.name);
    }
}

async fn run_tx<S: RemoteStore>(ledger: &mut Ledger<S>, command: TxCommand) -> Result<()> {
    match command {
        TxCommand::Add(args) => add(ledger, args).await,
        TxCommand::Edit(args) => edit(ledger, args).await,
        TxCommand::Toggle { id } => toggle(ledger, &id).await,
        TxCommand::Delete { id, series } => {
            if series {
                let recurrence_id = ledger
                    .snapshot()
                    .transaction(&id)
                    .and_then(|t| t.recurrence_id.clone())
                    .ok_or_else(|| AppError::Usage(format!("{id} is not part of a series")))?;
                ledger.delete_recurrence_series(&recurrence_id).await?;
                println!("deleted series {recurrence_id}");
            } else {
                ledger.delete_transaction(&id).await?;
                println!("deleted {id}");
            }
            Ok(())
        }
        TxCommand::Voice {
            transcript,
            paid_by,
        } => {
            let new = parse_transcript(&transcript, today()).into_new_transaction(paid_by)?;
            let tx = ledger.add_transaction(new).await?;
            print_transaction(&tx);
            Ok(())
        }
    }
}

async fn add<S: RemoteStore>(ledger: &mut Ledger<S>, args: TxAddArgs) -> Result<()> {
    let amount = if args.income {
        args.amount.abs()
    } else {
        args.amount.as_expense()
    };
    let new = NewTransaction {
        description: args.description,
        amount,
        date: args.date.unwrap_or_else(today),
        status: if args.pending {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Paid
        },
        category: args.category,
        paid_by: args.paid_by,
        recurrence_id: None,
    };

    let inserted = ledger
        .save_with_recurrence(None, new, args.repeat.map(Into::into))
        .await?;
    for tx in &inserted {
        print_transaction(tx);
    }
    Ok(())
}

async fn edit<S: RemoteStore>(ledger: &mut Ledger<S>, args: TxEditArgs) -> Result<()> {
    let amount = args.amount.map(|amount| {
        if args.income {
            amount.abs()
        } else {
            amount.as_expense()
        }
    });
    let patch = TransactionPatch {
        description: args.description,
        amount,
        date: args.date,
        status: None,
        category: args.category.map(Some),
        paid_by: args.paid_by.map(Some),
    };

    let scheduled = ledger
        .edit_transaction(&args.id, patch, args.repeat.map(Into::into))
        .await?;
    if let Some(tx) = ledger.snapshot().transaction(&args.id) {
        print_transaction(tx);
    }
    for tx in &scheduled {
        print_transaction(tx);
    }
    Ok(())
}

async fn toggle<S: RemoteStore>(ledger: &mut Ledger<S>, id: &str) -> Result<()> {
    let date = ledger
        .snapshot()
        .transaction(id)
        .map(|t| t.date)
        .ok_or_else(|| AppError::Usage(format!("unknown transaction {id}")))?;
    let (year, month) = (date.year(), date.month());

    let mut tracker = CompletionTracker::new();
    tracker.observe(&ledger.snapshot().month(year, month), ChangeCause::Navigation);

    ledger.toggle_status(id).await?;
    if let Some(tx) = ledger.snapshot().transaction(id) {
        print_transaction(tx);
    }
    if tracker.observe(&ledger.snapshot().month(year, month), ChangeCause::UserAction) {
        println!("{year}-{month:02} is fully paid!");
    }
    Ok(())
}

fn print_transaction(tx: &Transaction) {
    println!(
        "{} {:<7} {:>14} {} [{}] {}",
        tx.date,
        tx.status.as_str(),
        tx.amount.to_string(),
        tx.description,
        tx.category_label(),
        tx.id
    );
}

fn print_month<S: RemoteStore>(ledger: &Ledger<S>, args: MonthArgs) {
    let now = today();
    let view = ledger
        .snapshot()
        .month(args.year.unwrap_or(now.year()), args.month.unwrap_or(now.month()));

    println!("{}-{:02}", view.year, view.month);
    for tx in &view.transactions {
        print_transaction(tx);
    }
    println!(
        "realized {}  planned {}  total {}  progress {:.1}%",
        view.realized, view.planned, view.total, view.progress
    );
}

fn print_year<S: RemoteStore>(ledger: &Ledger<S>, args: YearArgs) {
    let view = ledger
        .snapshot()
        .year(args.year.unwrap_or(today().year()));

    println!(
        "{}: spent {}  planned {}",
        view.year, view.total_spent, view.total_planned
    );
    for (index, (realized, planned)) in view
        .monthly_realized
        .iter()
        .zip(view.monthly_planned.iter())
        .enumerate()
    {
        println!(
            "  {:02} {:>14} {:>5.1}% | {:>14} {:>5.1}%",
            index + 1,
            realized.to_string(),
            view.bar_height(*realized),
            planned.to_string(),
            view.bar_height(*planned)
        );
    }
    for category in &view.categories {
        println!(
            "  {:<16} {:>14} {:>5.1}%",
            category.category,
            category.total.to_string(),
            category.share
        );
    }
}
