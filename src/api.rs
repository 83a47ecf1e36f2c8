use std::collections::BTreeMap;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, put, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth;
use crate::balance::{self, Balances};
use crate::cache::BalanceCache;
use crate::error::{json_error, ApiError};
use crate::exchange::{self, Exchange};
use crate::expense;
use crate::money;
use crate::schemas::{Expense, Group, Member, Settlement};
use crate::settlement;
use crate::store::LedgerStore;

pub struct AppState {
    pub store: Arc<dyn LedgerStore>,
    pub cache: BalanceCache,
    pub secret: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(add_group)
        .service(get_group)
        .service(add_member)
        .service(get_balances)
        .service(add_expense)
        .service(list_expenses)
        .service(remove_expense)
        .service(add_settlement)
        .service(list_settlements)
        .service(all_balances)
        .service(health);
}

// ---- request bodies ----

#[derive(Deserialize, Serialize)]
struct GroupNameJson {
    name: String,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddMemberJson {
    user_id: String,
    name: String,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseJson {
    description: String,
    amount: f64,
    participant_ids: Vec<String>,
}

#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SettlementJson {
    to_user_id: String,
    amount: f64,
}

// ---- response bodies ----
//
// Everything below converts minor units back into display currency. This
// boundary is the only place amounts exist as floats.

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseView {
    id: String,
    description: String,
    amount: f64,
    paid_by_id: String,
    participant_ids: Vec<String>,
    created_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SettlementView {
    id: String,
    from_user_id: String,
    to_user_id: String,
    amount: f64,
    created_at: String,
}

#[derive(Serialize)]
struct ExchangeView {
    from: String,
    to: String,
    amount: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupExchangeView {
    from: String,
    to: String,
    amount: f64,
    group_id: String,
    group_name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GroupView {
    id: String,
    name: String,
    members: Vec<Member>,
    expenses: Vec<ExpenseView>,
    settlements: Vec<SettlementView>,
}

#[derive(Serialize)]
struct BalancesJson {
    balances: BTreeMap<String, f64>,
    settlements: Vec<ExchangeView>,
}

#[derive(Serialize)]
struct AllBalancesJson {
    balances: BTreeMap<String, f64>,
    settlements: Vec<GroupExchangeView>,
}

fn expense_view(expense: &Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id.clone(),
        description: expense.description.clone(),
        amount: money::to_display(expense.amount),
        paid_by_id: expense.payer.clone(),
        participant_ids: expense.participants.clone(),
        created_at: expense.created_at.to_rfc3339(),
    }
}

fn settlement_view(settlement: &Settlement) -> SettlementView {
    SettlementView {
        id: settlement.id.clone(),
        from_user_id: settlement.from.clone(),
        to_user_id: settlement.to.clone(),
        amount: money::to_display(settlement.amount),
        created_at: settlement.created_at.to_rfc3339(),
    }
}

fn exchange_view(exchange: &Exchange) -> ExchangeView {
    ExchangeView {
        from: exchange.from.clone(),
        to: exchange.to.clone(),
        amount: money::to_display(exchange.amount),
    }
}

fn group_view(group: &Group) -> GroupView {
    GroupView {
        id: group.id.clone(),
        name: group.name.clone(),
        members: group.members.clone(),
        expenses: group.expenses.iter().map(expense_view).collect(),
        settlements: group.settlements.iter().map(settlement_view).collect(),
    }
}

/// Sorted map so identical balances always serialize identically.
fn display_balances(balances: &Balances) -> BTreeMap<String, f64> {
    balances
        .iter()
        .map(|(id, &amount)| (id.clone(), money::to_display(amount)))
        .collect()
}

fn unauthorized() -> HttpResponse {
    json_error(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "missing or invalid credentials",
    )
}

/// Aggregate one snapshot, preferring the cached view when its version
/// matches. The zero-sum check runs on every fresh recomputation.
fn cached_balances(state: &AppState, group: &Group) -> Result<Balances, ApiError> {
    if let Some(balances) = state.cache.lookup(&group.id, group.ledger_version) {
        return Ok(balances);
    }
    let balances = balance::compute_balances(group);
    balance::check_zero_sum(&balances)?;
    state
        .cache
        .store(&group.id, group.ledger_version, balances.clone());
    Ok(balances)
}

// ---- handlers ----

#[put("/groups/{id}")]
async fn add_group(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<GroupNameJson>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let creator = Member {
        id: user.id,
        name: user.name,
    };
    let group = Group::new(id.into_inner(), json.into_inner().name, creator);
    match state.store.create_group(group.clone()).await {
        Ok(true) => HttpResponse::Created().json(group_view(&group)),
        Ok(false) => json_error(
            StatusCode::CONFLICT,
            "group_exists",
            "a group with this id already exists",
        ),
        Err(err) => ApiError::from(err).to_response(),
    }
}

#[get("/groups/{id}")]
async fn get_group(
    state: web::Data<AppState>,
    id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    match state.store.load_group(&id.into_inner()).await {
        Ok(group) if !group.is_member(&user.id) => ApiError::NotAMember(user.id).to_response(),
        Ok(group) => HttpResponse::Ok().json(group_view(&group)),
        Err(err) => ApiError::from(err).to_response(),
    }
}

#[post("/groups/{id}/members")]
async fn add_member(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<AddMemberJson>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let group_id = id.into_inner();
    let group = match state.store.load_group(&group_id).await {
        Ok(group) => group,
        Err(err) => return ApiError::from(err).to_response(),
    };
    if !group.is_member(&user.id) {
        return ApiError::NotAMember(user.id).to_response();
    }

    let body = json.into_inner();
    let member = Member {
        id: body.user_id,
        name: body.name,
    };
    let member_id = member.id.clone();
    match state.store.add_member(&group_id, member).await {
        Ok(true) => HttpResponse::Ok().json(json!({ "message": "member added" })),
        Ok(false) => ApiError::AlreadyAMember(member_id).to_response(),
        Err(err) => ApiError::from(err).to_response(),
    }
}

#[get("/groups/{id}/balances")]
async fn get_balances(
    state: web::Data<AppState>,
    id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let group = match state.store.load_group(&id.into_inner()).await {
        Ok(group) => group,
        Err(err) => return ApiError::from(err).to_response(),
    };
    if !group.is_member(&user.id) {
        return ApiError::NotAMember(user.id).to_response();
    }

    let balances = match cached_balances(&state, &group) {
        Ok(balances) => balances,
        Err(err) => return err.to_response(),
    };
    let exchanges = exchange::simplify(&balances);
    HttpResponse::Ok().json(BalancesJson {
        balances: display_balances(&balances),
        settlements: exchanges.iter().map(exchange_view).collect(),
    })
}

#[post("/groups/{id}/expenses")]
async fn add_expense(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<ExpenseJson>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let body = json.into_inner();
    let Some(amount) = money::to_minor_units(body.amount) else {
        return ApiError::InvalidAmount.to_response();
    };
    match expense::record_expense(
        state.store.as_ref(),
        &state.cache,
        &id.into_inner(),
        &user.id,
        body.description,
        amount,
        body.participant_ids,
    )
    .await
    {
        Ok(expense) => HttpResponse::Created().json(expense_view(&expense)),
        Err(err) => err.to_response(),
    }
}

#[get("/groups/{id}/expenses")]
async fn list_expenses(
    state: web::Data<AppState>,
    id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    match state.store.load_group(&id.into_inner()).await {
        Ok(group) if !group.is_member(&user.id) => ApiError::NotAMember(user.id).to_response(),
        Ok(group) => {
            let mut expenses: Vec<&Expense> = group.expenses.iter().collect();
            expenses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let views: Vec<ExpenseView> = expenses.into_iter().map(expense_view).collect();
            HttpResponse::Ok().json(views)
        }
        Err(err) => ApiError::from(err).to_response(),
    }
}

#[delete("/groups/{id}/expenses/{expense_id}")]
async fn remove_expense(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let (group_id, expense_id) = path.into_inner();
    match expense::delete_expense(
        state.store.as_ref(),
        &state.cache,
        &group_id,
        &expense_id,
        &user.id,
    )
    .await
    {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "expense deleted" })),
        Err(err) => err.to_response(),
    }
}

#[post("/groups/{id}/settlements")]
async fn add_settlement(
    state: web::Data<AppState>,
    id: web::Path<String>,
    json: web::Json<SettlementJson>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let body = json.into_inner();
    let Some(amount) = money::to_minor_units(body.amount) else {
        return ApiError::InvalidAmount.to_response();
    };
    match settlement::record_settlement(
        state.store.as_ref(),
        &state.cache,
        &id.into_inner(),
        &user.id,
        &body.to_user_id,
        amount,
    )
    .await
    {
        Ok(settlement) => HttpResponse::Created().json(settlement_view(&settlement)),
        Err(err) => err.to_response(),
    }
}

#[get("/groups/{id}/settlements")]
async fn list_settlements(
    state: web::Data<AppState>,
    id: web::Path<String>,
    req: HttpRequest,
) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    match state.store.load_group(&id.into_inner()).await {
        Ok(group) if !group.is_member(&user.id) => ApiError::NotAMember(user.id).to_response(),
        Ok(group) => {
            let mut settlements: Vec<&Settlement> = group.settlements.iter().collect();
            settlements.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            let views: Vec<SettlementView> = settlements.into_iter().map(settlement_view).collect();
            HttpResponse::Ok().json(views)
        }
        Err(err) => ApiError::from(err).to_response(),
    }
}

/// Merged view across every group the caller belongs to; suggestions stay
/// per-group since debts never net across groups.
#[get("/balances")]
async fn all_balances(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    let Some(user) = auth::authenticated_user(&req, &state.secret) else {
        return unauthorized();
    };
    let mut groups = match state.store.groups_for_user(&user.id).await {
        Ok(groups) => groups,
        Err(err) => return ApiError::from(err).to_response(),
    };
    groups.sort_by(|a, b| a.id.cmp(&b.id));

    let mut merged = Balances::new();
    let mut suggestions = Vec::new();
    for group in &groups {
        let balances = match cached_balances(&state, group) {
            Ok(balances) => balances,
            Err(err) => return err.to_response(),
        };
        for (id, amount) in &balances {
            *merged.entry(id.clone()).or_default() += amount;
        }
        for exchange in exchange::simplify(&balances) {
            suggestions.push(GroupExchangeView {
                from: exchange.from,
                to: exchange.to,
                amount: money::to_display(exchange.amount),
                group_id: group.id.clone(),
                group_name: group.name.clone(),
            });
        }
    }
    HttpResponse::Ok().json(AllBalancesJson {
        balances: display_balances(&merged),
        settlements: suggestions,
    })
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}
