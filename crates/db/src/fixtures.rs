use rust_decimal::Decimal;

use pillsprint_core::domain::medicine::MedicineRow;

use crate::connection::DbPool;
use crate::repositories::catalog::upsert_row;
use crate::repositories::RepositoryError;

struct SeedMedicine {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: &'static str,
    manufacturer: &'static str,
    dosage_form: &'static str,
    strength: &'static str,
    /// Base-unit price in cents.
    price_cents: i64,
    stock: i64,
    emergency: bool,
    requires_prescription: bool,
    composition: &'static [&'static str],
    side_effects: &'static [&'static str],
    warnings: &'static [&'static str],
    usage: Option<&'static str>,
}

/// Demo catalog. Covers every category the built-in symptom rules point at so
/// each rule has something to land on.
const SEED_MEDICINES: &[SeedMedicine] = &[
    SeedMedicine {
        id: "med-paracetamol-500",
        name: "Paracetamol 500mg",
        description: "Relieves mild to moderate pain and reduces fever",
        category: "Pain Relief",
        manufacturer: "Cipla",
        dosage_form: "Tablet",
        strength: "500mg",
        price_cents: 60,
        stock: 240,
        emergency: false,
        requires_prescription: false,
        composition: &["Paracetamol 500mg"],
        side_effects: &["Nausea", "Rash (rare)"],
        warnings: &["Do not exceed 4g per day", "Avoid with alcohol"],
        usage: Some("1-2 tablets every 4-6 hours as needed"),
    },
    SeedMedicine {
        id: "med-ibuprofen-400",
        name: "Ibuprofen 400mg",
        description: "Anti-inflammatory pain reliever for headaches, muscle and joint pain",
        category: "Pain Relief",
        manufacturer: "Abbott",
        dosage_form: "Tablet",
        strength: "400mg",
        price_cents: 95,
        stock: 120,
        emergency: false,
        requires_prescription: false,
        composition: &["Ibuprofen 400mg"],
        side_effects: &["Stomach upset", "Heartburn"],
        warnings: &["Take with food", "Not for people with stomach ulcers"],
        usage: Some("1 tablet every 8 hours after meals"),
    },
    SeedMedicine {
        id: "med-kids-fever-syrup",
        name: "Kids Fever Syrup",
        description: "Paracetamol suspension dosed for children",
        category: "Pediatric",
        manufacturer: "GSK",
        dosage_form: "Syrup",
        strength: "120mg/5ml",
        price_cents: 140,
        stock: 45,
        emergency: false,
        requires_prescription: false,
        composition: &["Paracetamol 120mg/5ml"],
        side_effects: &[],
        warnings: &["Dose by body weight"],
        usage: None,
    },
    SeedMedicine {
        id: "med-dextromethorphan-syrup",
        name: "Dry Cough Syrup",
        description: "Suppresses dry, irritating cough",
        category: "Cough & Cold",
        manufacturer: "Dabur",
        dosage_form: "Syrup",
        strength: "10mg/5ml",
        price_cents: 180,
        stock: 60,
        emergency: false,
        requires_prescription: false,
        composition: &["Dextromethorphan 10mg/5ml"],
        side_effects: &["Drowsiness", "Dizziness"],
        warnings: &["May cause drowsiness"],
        usage: Some("10ml every 6-8 hours"),
    },
    SeedMedicine {
        id: "med-salbutamol-inhaler",
        name: "Salbutamol Inhaler",
        description: "Fast-acting bronchodilator for asthma and wheezing",
        category: "Respiratory",
        manufacturer: "Cipla",
        dosage_form: "Inhaler",
        strength: "100mcg/dose",
        price_cents: 450,
        stock: 25,
        emergency: true,
        requires_prescription: true,
        composition: &["Salbutamol sulfate 100mcg"],
        side_effects: &["Tremor", "Palpitations"],
        warnings: &["Seek help if relief lasts under 3 hours"],
        usage: Some("1-2 puffs when needed"),
    },
    SeedMedicine {
        id: "med-aspirin-chewable",
        name: "Aspirin 325mg Chewable",
        description: "Chewable aspirin used while waiting for help during suspected heart attack",
        category: "Emergency",
        manufacturer: "Bayer",
        dosage_form: "Chewable Tablet",
        strength: "325mg",
        price_cents: 75,
        stock: 30,
        emergency: true,
        requires_prescription: false,
        composition: &["Acetylsalicylic acid 325mg"],
        side_effects: &["Stomach irritation"],
        warnings: &["Call emergency services first", "Not for children"],
        usage: Some("Chew one tablet and call emergency services"),
    },
    SeedMedicine {
        id: "med-sorbitrate-5",
        name: "Isosorbide Dinitrate 5mg",
        description: "Sublingual nitrate for angina chest pain",
        category: "Cardiac",
        manufacturer: "Abbott",
        dosage_form: "Sublingual Tablet",
        strength: "5mg",
        price_cents: 110,
        stock: 18,
        emergency: true,
        requires_prescription: true,
        composition: &["Isosorbide dinitrate 5mg"],
        side_effects: &["Headache", "Dizziness"],
        warnings: &["Do not combine with sildenafil"],
        usage: None,
    },
    SeedMedicine {
        id: "med-antacid-gel",
        name: "Antacid Gel",
        description: "Neutralises stomach acid for heartburn and indigestion",
        category: "Digestive",
        manufacturer: "Sun Pharma",
        dosage_form: "Suspension",
        strength: "200ml",
        price_cents: 130,
        stock: 80,
        emergency: false,
        requires_prescription: false,
        composition: &["Aluminium hydroxide", "Magnesium hydroxide", "Simethicone"],
        side_effects: &["Constipation"],
        warnings: &[],
        usage: Some("10ml after meals and at bedtime"),
    },
    SeedMedicine {
        id: "med-ors-sachet",
        name: "Oral Rehydration Salts",
        description: "Restores fluids and electrolytes lost through diarrhea or vomiting",
        category: "Digestive",
        manufacturer: "FDC",
        dosage_form: "Powder",
        strength: "21g sachet",
        price_cents: 25,
        stock: 300,
        emergency: false,
        requires_prescription: false,
        composition: &["Sodium chloride", "Potassium chloride", "Glucose"],
        side_effects: &[],
        warnings: &["Dissolve in clean water only"],
        usage: None,
    },
    SeedMedicine {
        id: "med-cetirizine-10",
        name: "Cetirizine 10mg",
        description: "Antihistamine for sneezing, runny nose and itchy eyes",
        category: "Allergy",
        manufacturer: "Dr. Reddy's",
        dosage_form: "Tablet",
        strength: "10mg",
        price_cents: 40,
        stock: 150,
        emergency: false,
        requires_prescription: false,
        composition: &["Cetirizine hydrochloride 10mg"],
        side_effects: &["Drowsiness", "Dry mouth"],
        warnings: &["Avoid driving if drowsy"],
        usage: Some("1 tablet once daily"),
    },
    SeedMedicine {
        id: "med-calamine-lotion",
        name: "Calamine Lotion",
        description: "Soothes itching and mild skin rashes",
        category: "Skin Care",
        manufacturer: "Lacto",
        dosage_form: "Lotion",
        strength: "100ml",
        price_cents: 150,
        stock: 40,
        emergency: false,
        requires_prescription: false,
        composition: &["Calamine 15%", "Zinc oxide 5%"],
        side_effects: &[],
        warnings: &["For external use only"],
        usage: None,
    },
    SeedMedicine {
        id: "med-antiseptic-cream",
        name: "Antiseptic Cream",
        description: "Prevents infection in minor cuts, burns and wounds",
        category: "First Aid",
        manufacturer: "Reckitt",
        dosage_form: "Cream",
        strength: "30g",
        price_cents: 120,
        stock: 70,
        emergency: false,
        requires_prescription: false,
        composition: &["Chloroxylenol", "Cetrimide"],
        side_effects: &[],
        warnings: &["For external use only"],
        usage: Some("Apply to the affected area 2-3 times daily"),
    },
    SeedMedicine {
        id: "med-melatonin-3",
        name: "Melatonin 3mg",
        description: "Supports natural sleep onset",
        category: "Sleep Aid",
        manufacturer: "HealthKart",
        dosage_form: "Tablet",
        strength: "3mg",
        price_cents: 300,
        stock: 35,
        emergency: false,
        requires_prescription: false,
        composition: &["Melatonin 3mg"],
        side_effects: &["Daytime drowsiness"],
        warnings: &["Not for use during pregnancy"],
        usage: Some("1 tablet 30 minutes before bed"),
    },
    SeedMedicine {
        id: "med-prenatal-iron",
        name: "Prenatal Iron + Folic Acid",
        description: "Iron and folic acid supplement for pregnancy",
        category: "Women's Health",
        manufacturer: "Mankind",
        dosage_form: "Tablet",
        strength: "100mg/0.5mg",
        price_cents: 220,
        stock: 55,
        emergency: false,
        requires_prescription: false,
        composition: &["Ferrous fumarate 100mg", "Folic acid 0.5mg"],
        side_effects: &["Dark stools", "Constipation"],
        warnings: &[],
        usage: None,
    },
    SeedMedicine {
        id: "med-vitamin-c-500",
        name: "Vitamin C 500mg",
        description: "",
        category: "Vitamins",
        manufacturer: "Himalaya",
        dosage_form: "Chewable Tablet",
        strength: "500mg",
        price_cents: 200,
        stock: 90,
        emergency: false,
        requires_prescription: false,
        composition: &["Ascorbic acid 500mg"],
        side_effects: &[],
        warnings: &[],
        usage: None,
    },
    SeedMedicine {
        id: "med-glucose-tablets",
        name: "Glucose Tablets",
        description: "Rapid glucose for low blood sugar episodes",
        category: "Diabetes",
        manufacturer: "Dexcom",
        dosage_form: "Chewable Tablet",
        strength: "4g",
        price_cents: 350,
        stock: 20,
        emergency: true,
        requires_prescription: false,
        composition: &["Dextrose 4g"],
        side_effects: &[],
        warnings: &["Recheck blood sugar after 15 minutes"],
        usage: None,
    },
    SeedMedicine {
        id: "med-lubricant-eye-drops",
        name: "Lubricant Eye Drops",
        description: "Relieves dry, tired eyes",
        category: "Eye Care",
        manufacturer: "Allergan",
        dosage_form: "Drops",
        strength: "10ml",
        price_cents: 260,
        stock: 0,
        emergency: false,
        requires_prescription: false,
        composition: &["Carboxymethylcellulose 0.5%"],
        side_effects: &["Temporary blurred vision"],
        warnings: &["Discard 28 days after opening"],
        usage: None,
    },
    SeedMedicine {
        id: "med-ear-wax-drops",
        name: "Ear Wax Softening Drops",
        description: "Softens ear wax for easy removal",
        category: "Ear Care",
        manufacturer: "Wockhardt",
        dosage_form: "Drops",
        strength: "10ml",
        price_cents: 170,
        stock: 22,
        emergency: false,
        requires_prescription: false,
        composition: &["Paradichlorobenzene", "Benzocaine", "Chlorbutol", "Turpentine oil"],
        side_effects: &[],
        warnings: &["Do not use with a perforated eardrum"],
        usage: None,
    },
];

impl SeedMedicine {
    fn to_row(&self) -> MedicineRow {
        let strings = |values: &[&str]| values.iter().map(|value| value.to_string()).collect();
        MedicineRow {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            category: Some(self.category.to_string()),
            manufacturer: Some(self.manufacturer.to_string()),
            dosage_form: Some(self.dosage_form.to_string()),
            strength: Some(self.strength.to_string()),
            base_price: Decimal::new(self.price_cents, 2),
            stock: Some(self.stock),
            emergency: Some(self.emergency),
            requires_prescription: Some(self.requires_prescription),
            composition: Some(strings(self.composition)),
            alternatives: Some(Vec::new()),
            side_effects: Some(strings(self.side_effects)),
            warnings: Some(strings(self.warnings)),
            usage_instructions: self.usage.map(str::to_string),
            storage_instructions: Some("Store below 25°C away from direct sunlight".to_string()),
            ..MedicineRow::default()
        }
    }
}

/// Deterministic demo catalog for local runs and end-to-end tests.
pub struct DemoCatalog;

impl DemoCatalog {
    pub fn rows() -> Vec<MedicineRow> {
        SEED_MEDICINES.iter().map(SeedMedicine::to_row).collect()
    }

    /// Upserts every demo row in one transaction. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        for row in Self::rows() {
            upsert_row(&mut *tx, &row).await?;
        }
        tx.commit().await?;

        Ok(SeedResult {
            medicines_seeded: SEED_MEDICINES.len(),
            categories: Self::categories(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::with_capacity(SEED_MEDICINES.len());
        for seed in SEED_MEDICINES {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM medicine WHERE id = ?1 AND category = ?2)",
            )
            .bind(seed.id)
            .bind(seed.category)
            .fetch_one(pool)
            .await?;
            checks.push((seed.id, present == 1));
        }

        let all_passed = checks.iter().all(|(_, passed)| *passed);
        Ok(VerificationResult { checks, all_passed })
    }

    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for seed in SEED_MEDICINES {
            sqlx::query("DELETE FROM medicine WHERE id = ?").bind(seed.id).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub fn categories() -> Vec<&'static str> {
        let mut categories: Vec<&'static str> =
            SEED_MEDICINES.iter().map(|seed| seed.category).collect();
        categories.sort_unstable();
        categories.dedup();
        categories
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedResult {
    pub medicines_seeded: usize,
    pub categories: Vec<&'static str>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationResult {
    pub checks: Vec<(&'static str, bool)>,
    pub all_passed: bool,
}
