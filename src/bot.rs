//! Telegram surface
//!
//! All presentation lives here; the services hand back plain structs and
//! this layer turns them into chat messages.

use std::sync::Arc;

use teloxide::dispatching::{Dispatcher, HandlerExt, UpdateFilterExt};
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use teloxide::utils::command::BotCommands;
use teloxide::utils::html;

use crate::entities::entitlement_record::GrantMethod;
use crate::extract::InvoiceExtractor;
use crate::prelude::*;
use crate::services::budget::UsageTier;
use crate::services::entitlement::Gate;
use crate::services::invoices::InvoiceFilter;
use crate::state::AppState;
use crate::token;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case")]
enum Command {
  // --- PUBLIC COMMANDS ---
  Start,
  Help,
  SetLimit(f64),
  Budget,
  Recent,
  Premium,
  Claim(String),
  Analysis,

  // --- ADMIN COMMANDS ---
  Gen(i64),
  #[command(parse_with = "split")]
  Grant {
    user_id: i64,
    days: i64,
  },
}

trait BotExt {
  async fn reply_to(
    &self,
    chat_id: ChatId,
    text: impl ToString,
  ) -> ResponseResult<()>;
}

impl BotExt for Bot {
  async fn reply_to(
    &self,
    chat_id: ChatId,
    text: impl ToString,
  ) -> ResponseResult<()> {
    self
      .send_message(chat_id, text.to_string())
      .parse_mode(ParseMode::Html)
      .await?;
    Ok(())
  }
}

fn help_text(admin: bool) -> String {
  let mut text = String::from("<b>Spendbot</b>\n\n");

  text.push_str("Send a receipt photo to record an invoice.\n\n");
  text.push_str("/set_limit <code>amount</code> - set your monthly budget\n");
  text.push_str("/budget - this month's spending vs your limit\n");
  text.push_str("/recent - your latest invoices\n");
  text.push_str("/premium - premium status\n");
  text.push_str("/claim <code>token</code> - redeem an activation token\n");
  text.push_str("/analysis - monthly breakdown (premium)\n");
  text.push_str("/help - show this menu\n");

  if admin {
    text.push_str("\n<b>Admin Commands:</b>\n");
    text.push_str("/gen <code>days</code> - issue an activation token\n");
    text.push_str(
      "/grant <code>user_id</code> <code>days</code> - grant premium directly\n",
    );
  }

  text
}

pub async fn run_bot(app: Arc<AppState>) {
  info!("Starting Telegram bot...");

  let bot = app.bot.clone();

  let handler = teloxide::dptree::entry()
    .branch(Update::filter_message().filter_command::<Command>().endpoint({
      let app = app.clone();
      move |bot: Bot, msg: Message, cmd: Command| {
        handle_command(app.clone(), bot, msg, cmd)
      }
    }))
    .branch(
      Update::filter_message()
        .filter(|msg: Message| msg.photo().is_some())
        .endpoint({
          let app = app.clone();
          move |bot: Bot, msg: Message| handle_photo(app.clone(), bot, msg)
        }),
    );

  Dispatcher::builder(bot, handler).build().dispatch().await;
}

/// Register the sender on every interaction and hand back the platform
/// user row the repositories key on.
async fn register(
  app: &AppState,
  msg: &Message,
) -> Result<crate::entities::platform_user::Model> {
  let display_name = msg.from.as_ref().map(|user| user.full_name());
  app
    .sv()
    .users
    .get_or_create(
      "telegram",
      &msg.chat.id.0.to_string(),
      display_name.as_deref(),
    )
    .await
}

async fn handle_command(
  app: Arc<AppState>,
  bot: Bot,
  msg: Message,
  cmd: Command,
) -> ResponseResult<()> {
  let chat_id = msg.chat.id;
  let tg_user_id = chat_id.0;

  let user = match register(&app, &msg).await {
    Ok(user) => user,
    Err(err) => {
      error!("failed to register user {tg_user_id}: {err}");
      return bot.reply_to(chat_id, err.user_message()).await;
    }
  };

  let sv = app.sv();

  match &cmd {
    Command::Start => {
      if let Err(err) = sv.entitlements.check_access(tg_user_id).await {
        error!("entitlement bootstrap failed for {tg_user_id}: {err}");
      }
      let text = "<b>Welcome to Spendbot!</b>\n\n\
        Send me a photo of a receipt and I will record it for you.\n\
        Use /help to see everything I can do.";
      bot.reply_to(chat_id, text).await?;
    }
    Command::Help => {
      bot
        .reply_to(chat_id, help_text(app.admins.contains(&tg_user_id)))
        .await?;
    }
    Command::SetLimit(amount) => {
      match sv.budget.set_monthly_limit(user.id, *amount).await {
        Ok(()) => {
          let text = format!(
            "Monthly limit set to <b>{}</b>.\nUse /budget to track it.",
            utils::format_amount(*amount)
          );
          bot.reply_to(chat_id, text).await?;
        }
        Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
      }
    }
    Command::Budget => match sv.budget.current_usage(user.id).await {
      Ok(usage) => bot.reply_to(chat_id, budget_text(&usage)).await?,
      Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
    },
    Command::Recent => {
      let filter = InvoiceFilter {
        owner: Some(user.id),
        limit: Some(10),
        ..Default::default()
      };
      match sv.invoices.query(filter).await {
        Ok(invoices) if invoices.is_empty() => {
          bot
            .reply_to(
              chat_id,
              "No invoices recorded yet. Send a receipt photo to add one.",
            )
            .await?;
        }
        Ok(invoices) => {
          let mut text = String::from("<b>Recent invoices</b>\n\n");
          for invoice in invoices {
            text.push_str(&format!(
              "{} {}: <b>{}</b>\n",
              invoice.invoice_date.format("%d.%m.%Y"),
              html::escape(&invoice.shop_name),
              utils::format_amount(invoice.total_amount),
            ));
          }
          bot.reply_to(chat_id, text).await?;
        }
        Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
      }
    }
    Command::Premium => match sv.entitlements.check_access(tg_user_id).await
    {
      Ok(access) if access.is_premium() => {
        let expires_at = access.expires_at.unwrap_or_default();
        let days_left = access
          .remaining()
          .map(|delta| delta.num_days())
          .unwrap_or_default();
        let via = match access.method {
          Some(GrantMethod::ClaimedToken) => "activation token",
          Some(GrantMethod::Payment) => "payment",
          None => "unknown",
        };
        let text = format!(
          "💎 <b>Premium active</b>\n\n\
           Expires: {}\nDays remaining: {}\nActivated via: {}",
          utils::format_date(expires_at),
          days_left,
          via,
        );
        bot.reply_to(chat_id, text).await?;
      }
      Ok(_) => {
        let text = "🆓 You are on the free plan.\n\n\
          Redeem an activation token with /claim <code>token</code> \
          to unlock premium analytics.";
        bot.reply_to(chat_id, text).await?;
      }
      Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
    },
    Command::Claim(raw) => {
      let raw = raw.trim();
      if raw.is_empty() {
        bot
          .reply_to(chat_id, "Usage: /claim <code>token</code>")
          .await?;
        return Ok(());
      }
      match sv.entitlements.claim_token(tg_user_id, raw, &app.token_secret).await
      {
        Ok(grant) => {
          let text = format!(
            "✅ Token claimed!\n\n\
             💎 Premium is active for <b>{} days</b>, until {}.",
            grant.grant_days,
            utils::format_date(grant.expires_at),
          );
          bot.reply_to(chat_id, text).await?;
        }
        Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
      }
    }
    Command::Analysis => {
      match sv.entitlements.require_premium(tg_user_id).await {
        Ok(Gate::Denied(message)) => bot.reply_to(chat_id, message).await?,
        Ok(Gate::Granted) => {
          bot.reply_to(chat_id, analysis_text(&app, user.id).await).await?;
        }
        Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
      }
    }
    Command::Gen(days) => {
      if !app.admins.contains(&tg_user_id) {
        bot
          .reply_to(chat_id, "This command is for administrators.")
          .await?;
        return Ok(());
      }
      if *days <= 0 {
        bot.reply_to(chat_id, "Usage: /gen <code>days</code>").await?;
        return Ok(());
      }
      match token::issue(&app.token_secret, *days, &format!("{days} days")) {
        Ok(raw) => {
          let text = format!(
            "Activation token ({days} days):\n<code>{raw}</code>"
          );
          bot.reply_to(chat_id, text).await?;
        }
        Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
      }
    }
    Command::Grant { user_id, days } => {
      if !app.admins.contains(&tg_user_id) {
        bot
          .reply_to(chat_id, "This command is for administrators.")
          .await?;
        return Ok(());
      }
      if *days <= 0 {
        bot
          .reply_to(chat_id, "Usage: /grant <code>user_id</code> <code>days</code>")
          .await?;
        return Ok(());
      }
      match sv
        .entitlements
        .activate(*user_id, GrantMethod::Payment, *days)
        .await
      {
        Ok(expires_at) => {
          let text = format!(
            "Premium granted to <code>{user_id}</code> until {}.",
            utils::format_date(expires_at),
          );
          bot.reply_to(chat_id, text).await?;
        }
        Err(err) => bot.reply_to(chat_id, err.user_message()).await?,
      }
    }
  }

  Ok(())
}

async fn handle_photo(
  app: Arc<AppState>,
  bot: Bot,
  msg: Message,
) -> ResponseResult<()> {
  let chat_id = msg.chat.id;

  let Some(extractor) = app.extractor.clone() else {
    return bot
      .reply_to(chat_id, "Receipt extraction is not configured.")
      .await;
  };

  let user = match register(&app, &msg).await {
    Ok(user) => user,
    Err(err) => {
      error!("failed to register user {}: {err}", chat_id.0);
      return bot.reply_to(chat_id, err.user_message()).await;
    }
  };

  // largest rendition is last
  let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) else {
    return Ok(());
  };

  let file = bot.get_file(photo.file.id.clone()).await?;
  let mut image = Vec::new();
  bot.download_file(&file.path, &mut image).await?;

  let extracted = match extractor.extract(&image).await {
    Ok(extracted) => extracted,
    Err(err) => {
      warn!("extraction failed for chat {}: {err}", chat_id.0);
      return bot.reply_to(chat_id, err.user_message()).await;
    }
  };

  let sv = app.sv();
  let mut inserted = sv
    .invoices
    .insert(Some(user.id), &extracted, Some(&file.path))
    .await;
  if matches!(inserted, Err(Error::Persistence { .. })) {
    // one retry on a fresh pooled connection before giving up
    inserted = sv
      .invoices
      .insert(Some(user.id), &extracted, Some(&file.path))
      .await;
  }

  match inserted {
    Ok(invoice_id) => {
      let mut text = format!(
        "🧾 Receipt recorded (#{invoice_id})\n\
         {}: <b>{}</b>",
        html::escape(&extracted.shop_name),
        utils::format_amount(extracted.total_amount),
      );

      match sv.budget.current_usage(user.id).await {
        Ok(usage) => match usage.tier {
          UsageTier::Exceeded => {
            text.push_str(
              "\n\n🚨 You have exceeded your monthly spending limit!",
            );
          }
          UsageTier::Warning | UsageTier::Approaching => {
            if let Some(percent) = usage.percent_used {
              text.push_str(&format!(
                "\n\n⚠️ You are at {percent:.1}% of your monthly limit."
              ));
            }
          }
          _ => {}
        },
        Err(err) => {
          warn!("budget check after insert failed: {err}");
        }
      }

      bot.reply_to(chat_id, text).await?;
    }
    Err(err) => {
      error!("failed to store invoice for chat {}: {err}", chat_id.0);
      bot.reply_to(chat_id, err.user_message()).await?;
    }
  }

  Ok(())
}

fn budget_text(usage: &crate::services::budget::BudgetUsage) -> String {
  let Some(limit) = usage.limit else {
    return format!(
      "💰 Spent this month: <b>{}</b>\n\n\
       No spending limit set. Use /set_limit <code>amount</code> to set one.",
      utils::format_amount(usage.current_spend),
    );
  };

  format!(
    "💰 <b>Monthly budget</b>\n\n\
     Limit: {}\n\
     Spent: {}\n\
     Remaining: {}\n\
     Usage: {:.1}% ({})",
    utils::format_amount(limit),
    utils::format_amount(usage.current_spend),
    utils::format_amount(usage.remaining.unwrap_or_default()),
    usage.percent_used.unwrap_or_default(),
    usage.tier.label(),
  )
}

async fn analysis_text(app: &AppState, owner_id: i64) -> String {
  let sv = app.sv();
  let (start, end) = utils::month_bounds(Utc::now().date_naive());

  let aggregate =
    sv.invoices.aggregate_spend(Some(owner_id), start, Some(end)).await;
  let shops =
    sv.invoices.spend_by_shop(Some(owner_id), start, Some(end), 5).await;

  match (aggregate, shops) {
    (Ok(aggregate), Ok(shops)) => {
      let mut text = format!(
        "📊 <b>This month</b>\n\n\
         Invoices: {}\n\
         Total: {}\n\
         Average: {}\n",
        aggregate.count,
        utils::format_amount(aggregate.total),
        utils::format_amount(aggregate.average),
      );
      if !shops.is_empty() {
        text.push_str("\n<b>Top shops</b>\n");
        for shop in shops {
          text.push_str(&format!(
            "• {}: {}\n",
            html::escape(&shop.shop_name),
            utils::format_amount(shop.total),
          ));
        }
      }
      text
    }
    (Err(err), _) | (_, Err(err)) => {
      error!("analysis query failed: {err}");
      err.user_message()
    }
  }
}
