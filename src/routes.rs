use actix_web::{delete, get, post, web, HttpResponse};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::balance::{aggregate, NetBalance};
use crate::config::Config;
use crate::errors::Result;
use crate::exchange::{check_conservation, simplify, ConservationWarning, Exchange};
use crate::filter::{filter_for_person, summarize};
use crate::schemas::{ensure_known, ExpenseRequest, PaymentRequest, Person};
use crate::split::{allocate, Allocation};
use crate::store::Store;

#[derive(Deserialize)]
struct PersonQuery {
    person: Option<Person>,
}

impl PersonQuery {
    fn person(&self) -> Option<&str> {
        self.person.as_deref().filter(|person| !person.is_empty())
    }
}

#[derive(Deserialize)]
struct SplitRequest {
    amount: Decimal,
    participants: Vec<Person>,
}

#[derive(Serialize)]
struct BalancesResponse {
    balances: NetBalance,
    settlements: Vec<Exchange>,
    warning: Option<ConservationWarning>,
}

// Shares listed in the order the participants were given, which is the order
// that decided who absorbed the rounding remainder.
struct OrderedShares<'a> {
    participants: &'a [Person],
    allocation: &'a Allocation,
}

impl Serialize for OrderedShares<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.participants.len()))?;
        for person in self.participants {
            if let Some(amount) = self.allocation.get(person) {
                map.serialize_entry(person, amount)?;
            }
        }
        map.end()
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_people)
        .service(list_expenses)
        .service(add_expense)
        .service(delete_expense)
        .service(list_payments)
        .service(add_payment)
        .service(delete_payment)
        .service(preview_split)
        .service(get_balances)
        .service(get_summary);
}

#[get("/people")]
async fn list_people(config: web::Data<Config>) -> HttpResponse {
    HttpResponse::Ok().json(&config.people)
}

#[get("/expenses")]
async fn list_expenses(
    store: web::Data<Store>,
    query: web::Query<PersonQuery>,
) -> Result<HttpResponse> {
    let expenses = store.list_expenses().await?;
    let (expenses, _) = filter_for_person(query.person(), &expenses, &[]);
    Ok(HttpResponse::Ok().json(expenses))
}

#[post("/expenses")]
async fn add_expense(
    store: web::Data<Store>,
    config: web::Data<Config>,
    json: web::Json<ExpenseRequest>,
) -> Result<HttpResponse> {
    let expense = json.into_inner().into_expense(&config.people, today())?;
    let expense = store.insert_expense(expense).await?;
    Ok(HttpResponse::Created().json(expense))
}

#[delete("/expenses/{id}")]
async fn delete_expense(store: web::Data<Store>, id: web::Path<String>) -> Result<HttpResponse> {
    store.delete_expense(&id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[get("/payments")]
async fn list_payments(
    store: web::Data<Store>,
    query: web::Query<PersonQuery>,
) -> Result<HttpResponse> {
    let payments = store.list_payments().await?;
    let (_, payments) = filter_for_person(query.person(), &[], &payments);
    Ok(HttpResponse::Ok().json(payments))
}

#[post("/payments")]
async fn add_payment(
    store: web::Data<Store>,
    config: web::Data<Config>,
    json: web::Json<PaymentRequest>,
) -> Result<HttpResponse> {
    let payment = json.into_inner().into_payment(&config.people, today())?;
    let payment = store.insert_payment(payment).await?;
    Ok(HttpResponse::Created().json(payment))
}

#[delete("/payments/{id}")]
async fn delete_payment(store: web::Data<Store>, id: web::Path<String>) -> Result<HttpResponse> {
    store.delete_payment(&id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Shares an amount would be split into, before the expense is submitted.
#[post("/split")]
async fn preview_split(
    config: web::Data<Config>,
    json: web::Json<SplitRequest>,
) -> Result<HttpResponse> {
    let request = json.into_inner();
    for person in &request.participants {
        ensure_known(person, &config.people)?;
    }
    let allocation = allocate(request.amount, &request.participants)?;
    Ok(HttpResponse::Ok().json(OrderedShares {
        participants: &request.participants,
        allocation: &allocation,
    }))
}

#[get("/balances")]
async fn get_balances(store: web::Data<Store>, config: web::Data<Config>) -> Result<HttpResponse> {
    let (expenses, payments) = tokio::try_join!(store.list_expenses(), store.list_payments())?;
    let balances = aggregate(&expenses, &payments, &config.people);
    let warning = check_conservation(&balances);
    let settlements = simplify(&balances);
    Ok(HttpResponse::Ok().json(BalancesResponse {
        balances,
        settlements,
        warning,
    }))
}

#[get("/summary")]
async fn get_summary(
    store: web::Data<Store>,
    config: web::Data<Config>,
    query: web::Query<PersonQuery>,
) -> Result<HttpResponse> {
    let person = query.person();
    if let Some(person) = person {
        ensure_known(person, &config.people)?;
    }

    let (expenses, payments) = tokio::try_join!(store.list_expenses(), store.list_payments())?;
    let balances = aggregate(&expenses, &payments, &config.people);
    let settlements = simplify(&balances);

    Ok(HttpResponse::Ok().json(summarize(
        person,
        &expenses,
        &payments,
        &balances,
        &settlements,
    )))
}
