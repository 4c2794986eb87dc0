//! Sample records for a fresh hospital management database.
//!
//! [seed_database] replaces `users`, `patients` and `canteen_sales` with a small,
//! realistic data set.  Patient identities are generated here, so every canteen sale
//! points at an existing patient.

use crate::config::SeedConf;
use crate::error::{MigrateError, Result};
use crate::store::Connection;
use crate::ID_KEY;
use bson::oid::ObjectId;
use bson::{doc, DateTime as BsonDateTime, Document};
use chrono::{DateTime, Duration, Local};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::info;

/// users collection name.
pub const USERS_COLL: &str = "users";
/// patients collection name.
pub const PATIENTS_COLL: &str = "patients";
/// canteen sales collection name.
pub const CANTEEN_SALES_COLL: &str = "canteen_sales";

/// who records every sample sale.
const SALES_RECORDER: &str = "CanteenGuy";
/// sales happen within this many days before now.
const SALES_WINDOW_DAYS: i64 = 30;

/// username, role, display name, email.
const USERS: [(&str, &str, &str, &str); 4] = [
    ("ImranSaab", "Admin", "Imran Khan (Admin)", "admin@pro.com"),
    ("DrSmith", "Doctor", "Dr. John Smith", "doctor@pro.com"),
    ("NurseJoy", "General Staff", "Nurse Joy", "nurse@pro.com"),
    ("CanteenGuy", "Canteen", "Chef Gordon", "canteen@pro.com"),
];

/// item, price.
const CANTEEN_MENU: [(&str, i32); 5] = [
    ("Tea", 50),
    ("Biscuits", 30),
    ("Juice", 100),
    ("Sandwich", 150),
    ("Cigarettes", 500),
];

struct PatientFixture {
    name: &'static str,
    father_name: &'static str,
    age: &'static str,
    cnic: &'static str,
    contact_no: &'static str,
    address: &'static str,
    admitted_within_days: i64,
    discharged_within_days: Option<i64>,
    monthly_fee: &'static str,
    monthly_allowance: &'static str,
    drug: &'static str,
    laundry_amount: i32,
    received_amount: &'static str,
    relation: &'static str,
}

const PATIENTS: [PatientFixture; 3] = [
    PatientFixture {
        name: "Ali Khan",
        father_name: "Ahmed Khan",
        age: "24",
        cnic: "35202-1234567-1",
        contact_no: "0300-1234567",
        address: "House 123, Street 4, Lahore",
        admitted_within_days: 90,
        discharged_within_days: None,
        monthly_fee: "45000",
        monthly_allowance: "5000",
        drug: "Heroin",
        laundry_amount: 3500,
        received_amount: "15000",
        relation: "Father",
    },
    PatientFixture {
        name: "Bilal Ahmed",
        father_name: "Rehman Ahmed",
        age: "32",
        cnic: "35202-7654321-9",
        contact_no: "0321-7654321",
        address: "Flat 5B, Gulberg, Lahore",
        admitted_within_days: 30,
        discharged_within_days: None,
        monthly_fee: "50000",
        monthly_allowance: "10000",
        drug: "Ice (Crystal Meth)",
        laundry_amount: 0,
        received_amount: "50000",
        relation: "Brother",
    },
    PatientFixture {
        name: "Chaudhry Bashir",
        father_name: "Chaudhry Nazeer",
        age: "45",
        cnic: "35202-1111111-1",
        contact_no: "0333-1111111",
        address: "Village 45GB, Faisalabad",
        admitted_within_days: 120,
        discharged_within_days: Some(10),
        monthly_fee: "35000",
        monthly_allowance: "3000",
        drug: "Opium",
        laundry_amount: 3500,
        received_amount: "100000",
        relation: "Father",
    },
];

/// How many records [seed_database] wrote per collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    /// users written.
    pub users: usize,
    /// patients written.
    pub patients: usize,
    /// canteen sales written.
    pub canteen_sales: usize,
}

/// Replace sample collections of `conn` with fixture records.
///
/// Each collection is cleared before being written.  Any store error stops seeding.
pub fn seed_database<C, R>(
    conn: &C,
    conf: &SeedConf,
    now: DateTime<Local>,
    rng: &mut R,
) -> Result<SeedSummary>
where
    C: Connection + ?Sized,
    R: Rng,
{
    let password_hash = conf.get_password_hash()?;
    info!(db = conn.db_name(), "Starting database seed.");

    let users = replace_collection(conn, USERS_COLL, sample_users(password_hash, now))?;

    let patients = sample_patients(now, rng);
    let patient_ids: Vec<ObjectId> = patients
        .iter()
        .filter_map(|p| p.get_object_id(ID_KEY).ok())
        .collect();
    let patients = replace_collection(conn, PATIENTS_COLL, patients)?;

    let sales = sample_sales(&patient_ids, conf.get_sales_count(), now, rng);
    let canteen_sales = replace_collection(conn, CANTEEN_SALES_COLL, sales)?;

    info!("Database seeding completed successfully.");
    Ok(SeedSummary {
        users,
        patients,
        canteen_sales,
    })
}

fn replace_collection<C>(conn: &C, coll: &str, docs: Vec<Document>) -> Result<usize>
where
    C: Connection + ?Sized,
{
    let seed_err = |source| MigrateError::Seed {
        coll: coll.to_string(),
        source,
    };
    info!(%coll, "Seeding collection.");
    conn.clear(coll).map_err(seed_err)?;
    let count = docs.len();
    if count > 0 {
        conn.write_batch(coll, docs).map_err(seed_err)?;
    }
    info!(%coll, count, "Inserted sample records.");
    Ok(count)
}

/// Staff accounts, one per role.
pub fn sample_users(password_hash: &str, now: DateTime<Local>) -> Vec<Document> {
    USERS
        .iter()
        .map(|(username, role, name, email)| {
            doc! {
                "username": *username,
                "password": password_hash,
                "role": *role,
                "name": *name,
                "email": *email,
                "created_at": to_bson_datetime(now),
            }
        })
        .collect()
}

/// Two active patients and a discharged one, with identities already assigned.
pub fn sample_patients<R: Rng>(now: DateTime<Local>, rng: &mut R) -> Vec<Document> {
    PATIENTS
        .iter()
        .map(|p| {
            let mut patient = doc! {
                ID_KEY: ObjectId::new(),
                "name": p.name,
                "fatherName": p.father_name,
                "age": p.age,
                "cnic": p.cnic,
                "contactNo": p.contact_no,
                "address": p.address,
                "admissionDate": iso_format(random_date(now, p.admitted_within_days, rng)),
            };
            if let Some(days) = p.discharged_within_days {
                patient.insert("dischargeDate", iso_format(random_date(now, days, rng)));
            }
            let discharged = p.discharged_within_days.is_some();
            let status = if discharged { "Discharged" } else { "Active" };
            patient.extend(doc! {
                "monthlyFee": p.monthly_fee,
                "monthlyAllowance": p.monthly_allowance,
                "drug": p.drug,
                "status": status,
                "isDischarged": discharged,
                "laundryStatus": p.laundry_amount > 0,
                "laundryAmount": p.laundry_amount,
                "receivedAmount": p.received_amount,
                "guardianName": p.father_name,
                "relation": p.relation,
                "created_at": to_bson_datetime(now),
            });
            patient
        })
        .collect()
}

/// `count` canteen sales, each for a random patient of `patient_ids`.
pub fn sample_sales<R: Rng>(
    patient_ids: &[ObjectId],
    count: usize,
    now: DateTime<Local>,
    rng: &mut R,
) -> Vec<Document> {
    let mut sales = Vec::with_capacity(count);
    for _ in 0..count {
        let (patient_id, (item, price)) =
            match (patient_ids.choose(rng), CANTEEN_MENU.choose(rng)) {
                (Some(id), Some(product)) => (id, product),
                _ => break,
            };
        sales.push(doc! {
            "patient_id": *patient_id,
            "item": *item,
            "amount": *price,
            "date": to_bson_datetime(random_date(now, SALES_WINDOW_DAYS, rng)),
            "recorded_by": SALES_RECORDER,
        });
    }
    sales
}

/// A random day within `days_ago` days before `now`.
fn random_date<R: Rng>(now: DateTime<Local>, days_ago: i64, rng: &mut R) -> DateTime<Local> {
    now - Duration::days(rng.gen_range(0..=days_ago))
}

fn to_bson_datetime(dt: DateTime<Local>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

fn iso_format(dt: DateTime<Local>) -> String {
    dt.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
