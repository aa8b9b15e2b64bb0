use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use dotenvy::dotenv;
use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::Value;
use serenity::{
    async_trait,
    client::{Client, EventHandler},
    framework::{
        standard::{
            Args, CommandResult,
            macros::{command, group},
        },
        StandardFramework,
    },
    model::{channel::Message, gateway::Ready},
    prelude::GatewayIntents,
    Result as SerenityResult,
};
use serenity::client::Context;
use serenity::framework::standard::CommandError;
use serenity::model::channel::ChannelType;
use serenity::model::guild::Guild;
use serenity::model::id::{GuildId, RoleId, UserId};
use serenity::model::prelude::VoiceState;
use songbird::{Songbird, SerenityInit, ytdl};
use songbird::input::ytdl_search;
use tracing::info;

use crate::error::MusicError;
use crate::models::{format_hms, Track};
use crate::registry::SessionRegistry;
use crate::session::VoiceSession;
use crate::settings::Settings;
use crate::votes::{VoteChoice, VoteTotals};

mod error;
mod models;
mod queue;
mod registry;
mod session;
mod settings;
mod votes;

struct Handler;

pub struct SessionManager;

impl serenity::prelude::TypeMapKey for SessionManager {
    type Value = Arc<SessionRegistry>;
}

pub struct SettingsManager;

impl serenity::prelude::TypeMapKey for SettingsManager {
    type Value = Arc<Settings>;
}

pub struct BotDataMap;

pub struct BotData {
    pub id: u64,
}

impl serenity::prelude::TypeMapKey for BotDataMap {
    type Value = BotData;
}

const UNKNOWN_TRACK_TITLE: &str = "UNKNOWN TRACK";
const DEFAULT_SETTINGS_PATH: &str = "settings.json";

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);

        let bot_data = BotData { id: ready.user.id.0 };
        let data = &mut ctx.data.write().await;
        data.insert::<BotDataMap>(bot_data);
    }

    async fn voice_state_update(&self, ctx: Context, _: Option<VoiceState>, new: VoiceState) {
        if new.channel_id.is_some() {
            return;
        }

        let bot_id: Option<u64>;

        {
            let data = ctx.data.read().await;
            bot_id = data.get::<BotDataMap>().map(|data| data.id);
        }

        if let (Some(bot_id), Some(guild_id)) = (bot_id, new.guild_id) {
            if bot_id == new.user_id.0 {
                info!("Dropped from voice in guild {}, tearing down session", guild_id.0);

                let registry = get_registry(&ctx).await;
                registry.stop(guild_id).await;
            }
        }
    }
}

#[group]
#[commands(
    join, summon, play, volume, pause, resume, stop, skip, keep, unvote, vote_stats, playing,
    playlist, removesong, roll, choose, joined, help
)]
struct General;

#[tokio::main]
async fn main() {
    dotenv().expect(".env file not found");

    tracing_subscriber::fmt::init();

    // Configure the client with your Discord bot token in the environment.
    let token = env::var("DISCORD_TOKEN")
        .expect("Expected a token in the environment");
    let settings_path = env::var("SETTINGS_PATH")
        .unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());

    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix("!")
        })
        .group(&GENERAL_GROUP);

    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .event_handler(Handler)
        .framework(framework)
        .register_songbird()
        .await
        .expect("Err creating client");

    let registry = Arc::new(SessionRegistry::new());

    {
        let mut w = client.data.write().await;

        w.insert::<SessionManager>(Arc::clone(&registry));
        w.insert::<SettingsManager>(Arc::new(Settings::load(settings_path)));
    }

    tokio::spawn(async move {
        let _ = client.start().await.map_err(|why| info!("Client ended: {why:?}"));
    });

    tokio::signal::ctrl_c().await.expect("Control-C interruption failed!");

    info!("Received Ctrl-C, shutting down.");
    registry.shutdown_all().await;
}

#[command]
#[only_in(guilds)]
async fn help(ctx: &Context, msg: &Message) -> CommandResult {
    let message = r#"
**Commands:**
    **join [CHANNEL]** - Joins the named voice channel.
    **summon** - Joins your current voice channel.
    **play [URL|Title]** - Queues a track given a URL or a search query.
    **volume [0-100]** - Sets the volume of the currently playing track.
    **pause** / **resume** - Pauses or resumes the current track.
    **stop** - Stops playback, clears the queue and leaves voice.
    **skip** / **keep** - Vote to skip or keep the current track.
    **unvote** - Removes your vote.
    **vote_stats** - Shows the weighted vote totals.
    **playing** - Shows the current track and elapsed time.
    **playlist** - Shows the queued tracks.
    **removesong [INDEX]** - Removes the queued track at that index.
    **roll [NdN]** - Rolls dice.
    **choose [OPTIONS...]** - Picks one of the options.
    **joined [@MEMBER]** - Says when a member joined.
    "#;

    check_msg(msg.channel_id.say(&ctx.http, message).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn join(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let name = args.message().trim();

    if name.is_empty() {
        check_msg(msg.channel_id.say(&ctx.http, "Usage: !join <voice channel name>").await);
        return Ok(());
    }

    let guild = get_guild(ctx, msg)?;

    let channel = guild
        .channels
        .values()
        .filter_map(|channel| channel.clone().guild())
        .find(|channel| channel.kind == ChannelType::Voice && channel.name == name);

    let channel = match channel {
        Some(channel) => channel,
        None => {
            check_msg(msg.channel_id.say(&ctx.http, "This is not a voice channel...").await);
            return Ok(());
        }
    };

    let manager = get_manager(ctx).await;

    let (_handler, join_result) = manager.join(guild.id, channel.id).await;
    if join_result.is_err() {
        check_msg(msg.channel_id.say(&ctx.http, "Error joining the channel").await);
        return Ok(());
    }

    get_or_create_session(ctx, guild.id).await;

    check_msg(
        msg.channel_id
            .say(&ctx.http, format!("Ready to play audio in {}", channel.name))
            .await,
    );

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn summon(ctx: &Context, msg: &Message) -> CommandResult {
    if summon_author_channel(ctx, msg).await? {
        let guild_id = get_guild_id(ctx, msg)?;
        get_or_create_session(ctx, guild_id).await;
    }

    Ok(())
}

/// Joins the author's voice channel. Returns false (after replying) when the
/// author is not in one or the join failed.
async fn summon_author_channel(ctx: &Context, msg: &Message) -> CommandResult<bool> {
    let guild = get_guild(ctx, msg)?;

    let channel_id = guild
        .voice_states.get(&msg.author.id)
        .and_then(|voice_state| voice_state.channel_id);

    let connect_to = match channel_id {
        Some(channel) => channel,
        None => {
            check_msg(msg.reply(ctx, "You are not in a voice channel.").await);

            return Ok(false);
        }
    };

    let manager = get_manager(ctx).await;

    let (_handler, join_result) = manager.join(guild.id, connect_to).await;
    if join_result.is_err() {
        check_msg(msg.channel_id.say(&ctx.http, "Error joining the channel").await);
        return Ok(false);
    }

    Ok(true)
}

#[command]
#[only_in(guilds)]
async fn play(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let query = args.message().trim().to_string();

    if query.is_empty() {
        check_msg(msg.channel_id.say(&ctx.http, "Usage: !play <url or search terms>").await);
        return Ok(());
    }

    let guild_id = get_guild_id(ctx, msg)?;
    let manager = get_manager(ctx).await;

    if manager.get(guild_id).is_none() && !summon_author_channel(ctx, msg).await? {
        return Ok(());
    }

    info!("User input is {query}");

    let input = if query.starts_with("http") {
        ytdl(&query).await
    } else {
        ytdl_search(&query).await
    };

    let input = match input {
        Ok(input) => input,
        Err(why) => {
            check_msg(
                msg.channel_id
                    .say(
                        &ctx.http,
                        format!("An error occurred while processing this request: ```\n{why:?}\n```"),
                    )
                    .await,
            );
            return Ok(());
        }
    };

    let title = input
        .metadata
        .title
        .clone()
        .unwrap_or_else(|| UNKNOWN_TRACK_TITLE.to_string());
    let duration = input.metadata.duration;

    let url = match input.metadata.source_url.clone() {
        Some(url) => url,
        None => {
            check_msg(
                msg.channel_id
                    .say(&ctx.http, format!("Could not load song for input {query}"))
                    .await,
            );
            return Ok(());
        }
    };

    let requester_name = msg
        .member
        .as_ref()
        .and_then(|member| member.nick.clone())
        .unwrap_or_else(|| msg.author.name.clone());

    let track = Track {
        title,
        url,
        duration,
        requester: msg.author.id,
        requester_name,
        channel: msg.channel_id,
    };
    let rendered = track.to_string();

    let session = get_or_create_session(ctx, guild_id).await;
    session.enqueue(track).await;

    check_msg(msg.channel_id.say(&ctx.http, format!("Enqueued {rendered}")).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn volume(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let value = match args.single::<i64>() {
        Ok(value) => value.clamp(0, 100),
        Err(_) => {
            let error =
                MusicError::InputFormat("Volume has to be a number between 0 and 100!".to_string());
            report_error(ctx, msg, &error).await;
            return Ok(());
        }
    };

    let guild_id = get_guild_id(ctx, msg)?;
    let session = match get_session(ctx, guild_id).await {
        Some(session) => session,
        None => {
            report_error(ctx, msg, &MusicError::NotConnected).await;
            return Ok(());
        }
    };

    let stored = value as f64 / 100.0;

    match session.set_volume(stored as f32).await {
        Ok(()) => {
            let settings = get_settings(ctx).await;
            settings
                .set_guild_stat(guild_id, settings::VOLUME, Value::from(stored))
                .await;

            check_msg(
                msg.channel_id
                    .say(&ctx.http, format!("Set the volume to {value}%"))
                    .await,
            );
        }
        Err(why) => report_error(ctx, msg, &why).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn pause(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    match get_session(ctx, guild_id).await {
        Some(session) => {
            if let Err(why) = session.pause().await {
                report_error(ctx, msg, &why).await;
            }
        }
        None => report_error(ctx, msg, &MusicError::NotConnected).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn resume(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    match get_session(ctx, guild_id).await {
        Some(session) => {
            if let Err(why) = session.resume().await {
                report_error(ctx, msg, &why).await;
            }
        }
        None => report_error(ctx, msg, &MusicError::NotConnected).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn stop(ctx: &Context, msg: &Message) -> CommandResult {
    let guild = get_guild(ctx, msg)?;

    if !has_stop_privileges(ctx, msg, &guild).await {
        report_error(ctx, msg, &MusicError::PermissionDenied).await;
        return Ok(());
    }

    let settings = get_settings(ctx).await;
    settings.delete_guild_stat(guild.id, settings::VOLUME).await;

    let registry = get_registry(ctx).await;
    let had_session = registry.stop(guild.id).await;

    if !had_session {
        // a bare join/summon connection without a session
        let manager = get_manager(ctx).await;

        if manager.get(guild.id).is_none() {
            check_msg(msg.reply(ctx, "Not in a voice channel").await);
            return Ok(());
        }

        if let Err(e) = manager.remove(guild.id).await {
            check_msg(msg.channel_id.say(&ctx.http, format!("Failed: {e:?}")).await);
        }
    }

    check_msg(msg.channel_id.say(&ctx.http, "Left voice channel").await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn skip(ctx: &Context, msg: &Message) -> CommandResult {
    cast_and_report(ctx, msg, VoteChoice::Skip).await
}

#[command]
#[only_in(guilds)]
async fn keep(ctx: &Context, msg: &Message) -> CommandResult {
    cast_and_report(ctx, msg, VoteChoice::Keep).await
}

async fn cast_and_report(ctx: &Context, msg: &Message, choice: VoteChoice) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let session = match get_session(ctx, guild_id).await {
        Some(session) => session,
        None => {
            report_error(ctx, msg, &MusicError::NotConnected).await;
            return Ok(());
        }
    };

    if !session.is_playing().await {
        report_error(ctx, msg, &MusicError::NotConnected).await;
        return Ok(());
    }

    if let Err(why) = session.cast_vote(msg.author.id, choice).await {
        report_error(ctx, msg, &why).await;
        return Ok(());
    }

    report_totals_and_maybe_skip(ctx, msg, guild_id, &session).await;

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn unvote(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let session = match get_session(ctx, guild_id).await {
        Some(session) => session,
        None => {
            report_error(ctx, msg, &MusicError::NotConnected).await;
            return Ok(());
        }
    };

    if !session.is_playing().await {
        report_error(ctx, msg, &MusicError::NotConnected).await;
        return Ok(());
    }

    match session.remove_vote(msg.author.id).await {
        Ok(removed) => {
            if !removed {
                check_msg(
                    msg.channel_id
                        .say(&ctx.http, "Your non-existent vote has been removed.")
                        .await,
                );
            }

            report_totals_and_maybe_skip(ctx, msg, guild_id, &session).await;
        }
        Err(why) => report_error(ctx, msg, &why).await,
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn vote_stats(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    match get_session(ctx, guild_id).await {
        Some(session) => {
            let totals = weighted_totals(ctx, guild_id, &session).await;
            announce_totals(ctx, msg, &totals).await;
        }
        None => report_error(ctx, msg, &MusicError::NotConnected).await,
    }

    Ok(())
}

/// Recounts the weighted totals, announces them, and skips the track as soon
/// as skips win. Runs after every vote-affecting command, not in a batch.
async fn report_totals_and_maybe_skip(
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    session: &Arc<VoiceSession>,
) {
    let totals = weighted_totals(ctx, guild_id, session).await;
    announce_totals(ctx, msg, &totals).await;

    if totals.winner() == VoteChoice::Skip {
        check_msg(
            msg.channel_id
                .say(&ctx.http, "Looks like skips WINS! sorry guys, skipping the song...")
                .await,
        );
        session.skip().await;
    }
}

async fn weighted_totals(
    ctx: &Context,
    guild_id: GuildId,
    session: &Arc<VoiceSession>,
) -> VoteTotals {
    let settings = get_settings(ctx).await;
    let votes = session.votes_snapshot().await;

    let mut weights: HashMap<UserId, u64> = HashMap::new();
    for vote in &votes {
        let xp = settings.user_xp(guild_id, vote.voter).await;
        weights.insert(vote.voter, xp);
    }

    votes::tally(&votes, |voter| weights.get(&voter).copied().unwrap_or(0))
}

async fn announce_totals(ctx: &Context, msg: &Message, totals: &VoteTotals) {
    check_msg(
        msg.channel_id
            .say(
                &ctx.http,
                format!(
                    "**Total Votes**:\nKeeps Score: {}\nSkips Score: {}",
                    totals.keep, totals.skip
                ),
            )
            .await,
    );
}

#[command]
#[only_in(guilds)]
async fn playing(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let current = match get_session(ctx, guild_id).await {
        Some(session) => match session.current_track().await {
            Some(track) => Some((track, session.elapsed().await)),
            None => None,
        },
        None => None,
    };

    match current {
        Some((track, elapsed)) => {
            check_msg(
                msg.channel_id
                    .say(
                        &ctx.http,
                        format!("Now playing - {track} [{}]", format_hms(elapsed)),
                    )
                    .await,
            );
        }
        None => check_msg(msg.channel_id.say(&ctx.http, "Not playing anything.").await),
    }

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn playlist(ctx: &Context, msg: &Message) -> CommandResult {
    let guild_id = get_guild_id(ctx, msg)?;

    let tracks = match get_session(ctx, guild_id).await {
        Some(session) => session.queue_snapshot().await,
        None => Vec::new(),
    };

    if tracks.is_empty() {
        check_msg(msg.channel_id.say(&ctx.http, "No songs in the playlist").await);
        return Ok(());
    }

    let mut listing = String::from("**Current PlayList**\n\n");
    for (index, track) in tracks.iter().enumerate() {
        listing.push_str(&format!("{}. {track}\n", index + 1));
    }

    check_msg(msg.channel_id.say(&ctx.http, listing).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn removesong(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let guild = get_guild(ctx, msg)?;

    if !has_stop_privileges(ctx, msg, &guild).await {
        report_error(ctx, msg, &MusicError::PermissionDenied).await;
        return Ok(());
    }

    // 1-based, as shown by !playlist
    let index = match args.single::<usize>() {
        Ok(index) if index >= 1 => index,
        _ => {
            report_error(ctx, msg, &MusicError::InvalidIndex).await;
            return Ok(());
        }
    };

    let session = match get_session(ctx, guild.id).await {
        Some(session) => session,
        None => {
            report_error(ctx, msg, &MusicError::NotConnected).await;
            return Ok(());
        }
    };

    match session.remove_song(index - 1).await {
        Ok(track) => {
            check_msg(
                msg.channel_id
                    .say(&ctx.http, format!("Deleted {track} from playlist"))
                    .await,
            );
        }
        Err(why) => report_error(ctx, msg, &why).await,
    }

    Ok(())
}

#[command]
async fn roll(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    match parse_dice(args.message().trim()) {
        Ok((rolls, limit)) => {
            let result = {
                let mut rng = rand::thread_rng();
                (0..rolls)
                    .map(|_| rng.gen_range(1..=limit).to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            check_msg(msg.channel_id.say(&ctx.http, result).await);
        }
        Err(why) => report_error(ctx, msg, &why).await,
    }

    Ok(())
}

/// Parses `NdN` dice notation into (rolls, faces).
fn parse_dice(dice: &str) -> Result<(u32, u32), MusicError> {
    let format_error = || MusicError::InputFormat("Format has to be in NdN!".to_string());

    let (rolls, limit) = dice.split_once('d').ok_or_else(format_error)?;
    let rolls: u32 = rolls.parse().map_err(|_| format_error())?;
    let limit: u32 = limit.parse().map_err(|_| format_error())?;

    if rolls == 0 || limit == 0 {
        return Err(format_error());
    }

    Ok((rolls, limit))
}

#[command]
async fn choose(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let choices: Vec<&str> = args.raw().collect();

    let reply = match choices.choose(&mut rand::thread_rng()) {
        Some(choice) => choice.to_string(),
        None => "Nothing to choose from...".to_string(),
    };

    check_msg(msg.channel_id.say(&ctx.http, reply).await);

    Ok(())
}

#[command]
#[only_in(guilds)]
async fn joined(ctx: &Context, msg: &Message) -> CommandResult {
    let guild = get_guild(ctx, msg)?;

    let user = msg
        .mentions
        .iter()
        .find(|user| !user.bot)
        .map(|user| user.id)
        .unwrap_or(msg.author.id);

    let member = guild.member(&ctx.http, user).await?;

    match member.joined_at {
        Some(joined_at) => {
            check_msg(
                msg.channel_id
                    .say(&ctx.http, format!("{} joined {joined_at}", member.display_name()))
                    .await,
            );
        }
        None => check_msg(msg.channel_id.say(&ctx.http, "No join date on record.").await),
    }

    Ok(())
}

/// stop/removesong gate: the configured role if one is set, otherwise guild
/// owner or an administrator role.
async fn has_stop_privileges(ctx: &Context, msg: &Message, guild: &Guild) -> bool {
    let settings = get_settings(ctx).await;
    let required_role = settings
        .guild_string(guild.id, settings::REQUIRED_STOP_ROLE)
        .await
        .unwrap_or_default();

    let member_roles: Vec<RoleId> = msg
        .member
        .as_ref()
        .map(|member| member.roles.clone())
        .unwrap_or_default();

    if required_role.is_empty() {
        return is_admin(guild, &member_roles, msg.author.id);
    }

    match required_role.parse::<u64>() {
        Ok(role_id) => member_roles.contains(&RoleId(role_id)),
        Err(_) => member_roles.iter().any(|role_id| {
            guild
                .roles
                .get(role_id)
                .map(|role| role.name == required_role)
                .unwrap_or(false)
        }),
    }
}

fn is_admin(guild: &Guild, member_roles: &[RoleId], user: UserId) -> bool {
    if user == guild.owner_id {
        return true;
    }

    member_roles.iter().any(|role_id| {
        guild
            .roles
            .get(role_id)
            .map(|role| role.permissions.administrator())
            .unwrap_or(false)
    })
}

async fn report_error(ctx: &Context, msg: &Message, error: &MusicError) {
    check_msg(msg.channel_id.say(&ctx.http, error.to_string()).await);
}

async fn get_registry(ctx: &Context) -> Arc<SessionRegistry> {
    let data = ctx.data.read().await;

    data.get::<SessionManager>()
        .expect("Session registry placed in at initialisation.")
        .clone()
}

async fn get_settings(ctx: &Context) -> Arc<Settings> {
    let data = ctx.data.read().await;

    data.get::<SettingsManager>()
        .expect("Settings store placed in at initialisation.")
        .clone()
}

async fn get_manager(ctx: &Context) -> Arc<Songbird> {
    songbird::get(ctx).await
        .expect("Songbird Voice client placed in at initialisation.").clone()
}

async fn get_session(ctx: &Context, guild_id: GuildId) -> Option<Arc<VoiceSession>> {
    get_registry(ctx).await.get(guild_id).await
}

async fn get_or_create_session(ctx: &Context, guild_id: GuildId) -> Arc<VoiceSession> {
    let registry = get_registry(ctx).await;
    let settings = get_settings(ctx).await;
    let manager = get_manager(ctx).await;

    registry
        .get_or_create(guild_id, ctx.http.clone(), manager, settings)
        .await
}

/// Checks that a message successfully sent; if not, then logs why to stdout.
pub fn check_msg(result: SerenityResult<Message>) {
    if let Err(why) = result {
        info!("Error sending message: {why:?}");
    }
}

fn get_guild(ctx: &Context, msg: &Message) -> CommandResult<Guild> {
    msg.guild(&ctx.cache).ok_or(CommandError::from("Guild not found"))
}

fn get_guild_id(ctx: &Context, msg: &Message) -> CommandResult<GuildId> {
    let guild_id = get_guild(ctx, msg)?.id;

    Ok(guild_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dice_notation_parses() {
        assert_eq!(parse_dice("2d6").unwrap(), (2, 6));
        assert_eq!(parse_dice("1d20").unwrap(), (1, 20));
    }

    #[test]
    fn malformed_dice_is_an_input_format_error() {
        for input in ["", "d6", "2d", "2x6", "0d6", "2d0", "ad6", "2dd6"] {
            assert!(
                matches!(parse_dice(input), Err(MusicError::InputFormat(_))),
                "{input} should not parse"
            );
        }
    }
}
