use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Entity, Error,
    category::get_category,
    database_id::{CategoryCode, VehicleCode},
};

/// Vehicles priced above this are listed as premium.
pub const PREMIUM_PRICE_THRESHOLD: f64 = 50_000.0;

/// The earliest model year accepted for a vehicle.
pub const MIN_YEAR: i32 = 1900;

/// The longest vehicle name accepted.
pub const MAX_NAME_LENGTH: usize = 100;

/// A vehicle the dealership sells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub code: VehicleCode,
    pub name: String,
    pub category_code: CategoryCode,
    pub price: f64,
    pub year: i32,
    pub mileage: i64,
    pub image: Option<String>,
    pub is_visible: bool,
}

/// A vehicle along with the name of its category, as shown in the public listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleListing {
    #[serde(flatten)]
    pub vehicle: Vehicle,
    pub category_name: String,
}

/// The editable fields of a vehicle.
///
/// Used both to create a vehicle and to replace all fields of an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleForm {
    pub name: String,
    pub category_code: CategoryCode,
    pub price: f64,
    pub year: i32,
    pub mileage: i64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_visibility")]
    pub is_visible: bool,
}

fn default_visibility() -> bool {
    true
}

/// A partial update to a vehicle, fields that are absent keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehiclePatch {
    pub name: Option<String>,
    pub category_code: Option<CategoryCode>,
    pub price: Option<f64>,
    pub year: Option<i32>,
    pub mileage: Option<i64>,
    pub image: Option<String>,
    pub is_visible: Option<bool>,
}

impl VehiclePatch {
    fn apply(self, vehicle: Vehicle) -> VehicleForm {
        VehicleForm {
            name: self.name.unwrap_or(vehicle.name),
            category_code: self.category_code.unwrap_or(vehicle.category_code),
            price: self.price.unwrap_or(vehicle.price),
            year: self.year.unwrap_or(vehicle.year),
            mileage: self.mileage.unwrap_or(vehicle.mileage),
            image: self.image.or(vehicle.image),
            is_visible: self.is_visible.unwrap_or(vehicle.is_visible),
        }
    }
}

pub fn create_vehicle_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS vehicle (
            code INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category_code INTEGER NOT NULL,
            price REAL NOT NULL CHECK (price > 0),
            year INTEGER NOT NULL,
            mileage INTEGER NOT NULL CHECK (mileage >= 0),
            image TEXT,
            is_visible INTEGER NOT NULL DEFAULT 1,
            FOREIGN KEY(category_code) REFERENCES category(code) ON DELETE RESTRICT
        )",
        (),
    )?;

    Ok(())
}

const VEHICLE_COLUMNS: &str =
    "vehicle.code, vehicle.name, vehicle.category_code, vehicle.price, vehicle.year, \
    vehicle.mileage, vehicle.image, vehicle.is_visible";

pub fn map_vehicle_row(row: &rusqlite::Row) -> Result<Vehicle, rusqlite::Error> {
    Ok(Vehicle {
        code: row.get(0)?,
        name: row.get(1)?,
        category_code: row.get(2)?,
        price: row.get(3)?,
        year: row.get(4)?,
        mileage: row.get(5)?,
        image: row.get(6)?,
        is_visible: row.get(7)?,
    })
}

fn map_listing_row(row: &rusqlite::Row) -> Result<VehicleListing, rusqlite::Error> {
    Ok(VehicleListing {
        vehicle: map_vehicle_row(row)?,
        category_name: row.get(8)?,
    })
}

/// Check the fields of a vehicle that do not need the database.
///
/// # Errors
/// Returns [Error::Validation] naming the first invalid field.
pub fn validate_vehicle(form: &VehicleForm) -> Result<(), Error> {
    let name = form.name.trim();

    if name.is_empty() {
        return Err(Error::validation("name", "must not be empty"));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::validation(
            "name",
            format!("must be at most {MAX_NAME_LENGTH} characters"),
        ));
    }

    if !(form.price.is_finite() && form.price > 0.0) {
        return Err(Error::validation("price", "must be greater than zero"));
    }

    let max_year = OffsetDateTime::now_utc().year() + 1;
    if !(MIN_YEAR..=max_year).contains(&form.year) {
        return Err(Error::validation(
            "year",
            format!("must be between {MIN_YEAR} and {max_year}"),
        ));
    }

    if form.mileage < 0 {
        return Err(Error::validation("mileage", "must not be negative"));
    }

    Ok(())
}

fn check_category_exists(code: CategoryCode, connection: &Connection) -> Result<(), Error> {
    match get_category(code, connection) {
        Ok(_) => Ok(()),
        Err(Error::NotFound) => Err(Error::ReferenceNotFound {
            entity: Entity::Category,
            code,
        }),
        Err(error) => Err(error),
    }
}

/// Create a vehicle.
///
/// # Errors
/// - [Error::Validation] if a field is invalid.
/// - [Error::ReferenceNotFound] if the category does not exist.
pub fn create_vehicle(form: &VehicleForm, connection: &Connection) -> Result<Vehicle, Error> {
    validate_vehicle(form)?;
    check_category_exists(form.category_code, connection)?;

    let vehicle = connection
        .prepare(&format!(
            "INSERT INTO vehicle (name, category_code, price, year, mileage, image, is_visible)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {VEHICLE_COLUMNS}"
        ))?
        .query_row(
            (
                form.name.trim(),
                form.category_code,
                form.price,
                form.year,
                form.mileage,
                &form.image,
                form.is_visible,
            ),
            map_vehicle_row,
        )?;

    Ok(vehicle)
}

/// Get a vehicle by its code, whether or not it is visible.
///
/// # Errors
/// Returns [Error::NotFound] if no vehicle has the code.
pub fn get_vehicle(code: VehicleCode, connection: &Connection) -> Result<Vehicle, Error> {
    connection
        .prepare(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE code = :code"
        ))?
        .query_row(&[(":code", &code)], map_vehicle_row)
        .map_err(|error| error.into())
}

fn query_visible_listings(
    condition: &str,
    params: impl rusqlite::Params,
    connection: &Connection,
) -> Result<Vec<VehicleListing>, Error> {
    connection
        .prepare(&format!(
            "SELECT {VEHICLE_COLUMNS}, category.name
            FROM vehicle
            INNER JOIN category ON category.code = vehicle.category_code
            WHERE vehicle.is_visible = 1 AND ({condition})
            ORDER BY vehicle.code"
        ))?
        .query_map(params, map_listing_row)?
        .map(|maybe_listing| maybe_listing.map_err(Error::from))
        .collect()
}

/// Get the vehicles shown to the public.
pub fn get_visible_vehicles(connection: &Connection) -> Result<Vec<VehicleListing>, Error> {
    query_visible_listings("1 = 1", [], connection)
}

/// Get the visible vehicles priced within the inclusive range, either bound may be open.
///
/// # Errors
/// Returns [Error::Validation] if the minimum price is above the maximum price.
pub fn get_vehicles_by_price(
    min_price: Option<f64>,
    max_price: Option<f64>,
    connection: &Connection,
) -> Result<Vec<VehicleListing>, Error> {
    if let (Some(min_price), Some(max_price)) = (min_price, max_price) {
        if min_price > max_price {
            return Err(Error::validation(
                "min_price",
                "must not be greater than max_price",
            ));
        }
    }

    query_visible_listings(
        "(?1 IS NULL OR vehicle.price >= ?1) AND (?2 IS NULL OR vehicle.price <= ?2)",
        (min_price, max_price),
        connection,
    )
}

/// Get the visible vehicles priced above [PREMIUM_PRICE_THRESHOLD].
pub fn get_premium_vehicles(connection: &Connection) -> Result<Vec<VehicleListing>, Error> {
    query_visible_listings("vehicle.price > ?1", [PREMIUM_PRICE_THRESHOLD], connection)
}

/// Replace every editable field of a vehicle.
///
/// # Errors
/// - [Error::NotFound] if no vehicle has the code.
/// - [Error::Validation] if a field is invalid.
/// - [Error::ReferenceNotFound] if the category does not exist.
pub fn update_vehicle(
    code: VehicleCode,
    form: &VehicleForm,
    connection: &Connection,
) -> Result<Vehicle, Error> {
    validate_vehicle(form)?;
    check_category_exists(form.category_code, connection)?;

    connection
        .prepare(&format!(
            "UPDATE vehicle
            SET name = ?1, category_code = ?2, price = ?3, year = ?4, mileage = ?5, image = ?6,
                is_visible = ?7
            WHERE code = ?8
            RETURNING {VEHICLE_COLUMNS}"
        ))?
        .query_row(
            (
                form.name.trim(),
                form.category_code,
                form.price,
                form.year,
                form.mileage,
                &form.image,
                form.is_visible,
                code,
            ),
            map_vehicle_row,
        )
        .map_err(|error| error.into())
}

/// Change only the fields given in `patch`.
///
/// The merged vehicle is validated as a whole, so a patch cannot leave the vehicle invalid.
pub fn patch_vehicle(
    code: VehicleCode,
    patch: VehiclePatch,
    connection: &Connection,
) -> Result<Vehicle, Error> {
    let vehicle = get_vehicle(code, connection)?;
    let form = patch.apply(vehicle);

    update_vehicle(code, &form, connection)
}

/// Remove a vehicle from the public listings without deleting it.
///
/// # Errors
/// Returns [Error::NotFound] if no vehicle has the code.
pub fn hide_vehicle(code: VehicleCode, connection: &Connection) -> Result<Vehicle, Error> {
    connection
        .prepare(&format!(
            "UPDATE vehicle SET is_visible = 0 WHERE code = :code RETURNING {VEHICLE_COLUMNS}"
        ))?
        .query_row(&[(":code", &code)], map_vehicle_row)
        .map_err(|error| error.into())
}

/// Delete a vehicle along with its inventory records.
///
/// Both deletes happen in one database transaction.
///
/// # Errors
/// - [Error::NotFound] if no vehicle has the code.
/// - [Error::InUse] if the vehicle has been sold or has maintenance records.
pub fn delete_vehicle(code: VehicleCode, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction.execute(
        "DELETE FROM inventory WHERE vehicle_code = :code",
        &[(":code", &code)],
    )?;

    let rows_affected = transaction
        .execute("DELETE FROM vehicle WHERE code = :code", &[(":code", &code)])
        .map_err(|error| match Error::from(error) {
            Error::InvalidReference => Error::InUse,
            error => error,
        })?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}


#[cfg(test)]
mod validate_vehicle_tests {
    use time::OffsetDateTime;

    use crate::{Error, vehicle::VehicleForm};

    use super::validate_vehicle;

    fn valid_form() -> VehicleForm {
        VehicleForm {
            name: "Corolla".to_owned(),
            category_code: 1,
            price: 20_000.0,
            year: 2020,
            mileage: 10_000,
            image: None,
            is_visible: true,
        }
    }

    #[track_caller]
    fn assert_invalid_field(form: VehicleForm, want_field: &str) {
        match validate_vehicle(&form) {
            Err(Error::Validation { field, .. }) => assert_eq!(field, want_field),
            other => panic!("expected validation error for {want_field}, got {other:?}"),
        }
    }

    #[test]
    fn accepts_valid_vehicle() {
        assert_eq!(validate_vehicle(&valid_form()), Ok(()));
    }

    #[test]
    fn rejects_blank_or_long_name() {
        assert_invalid_field(
            VehicleForm {
                name: "  ".to_owned(),
                ..valid_form()
            },
            "name",
        );
        assert_invalid_field(
            VehicleForm {
                name: "x".repeat(101),
                ..valid_form()
            },
            "name",
        );
    }

    #[test]
    fn rejects_non_positive_price() {
        assert_invalid_field(
            VehicleForm {
                price: 0.0,
                ..valid_form()
            },
            "price",
        );
        assert_invalid_field(
            VehicleForm {
                price: f64::NAN,
                ..valid_form()
            },
            "price",
        );
    }

    #[test]
    fn rejects_year_out_of_range() {
        assert_invalid_field(
            VehicleForm {
                year: 1899,
                ..valid_form()
            },
            "year",
        );
        assert_invalid_field(
            VehicleForm {
                year: OffsetDateTime::now_utc().year() + 2,
                ..valid_form()
            },
            "year",
        );
    }

    #[test]
    fn rejects_negative_mileage() {
        assert_invalid_field(
            VehicleForm {
                mileage: -1,
                ..valid_form()
            },
            "mileage",
        );
    }
}

#[cfg(test)]
mod vehicle_tests {
    use crate::{
        Entity, Error,
        inventory::get_stock,
        test_utils::{
            get_test_connection, insert_test_category, insert_test_inventory, insert_test_sale,
            insert_test_vehicle, test_vehicle_form,
        },
        vehicle::{
            VehicleForm, VehiclePatch, create_vehicle, delete_vehicle, get_premium_vehicles,
            get_vehicle, get_vehicles_by_price, get_visible_vehicles, hide_vehicle, patch_vehicle,
        },
    };

    #[test]
    fn create_vehicle_requires_existing_category() {
        let connection = get_test_connection();

        let result = create_vehicle(&test_vehicle_form(42, 20_000.0), &connection);

        assert_eq!(
            result,
            Err(Error::ReferenceNotFound {
                entity: Entity::Category,
                code: 42
            })
        );
    }

    #[test]
    fn new_vehicles_are_visible() {
        let connection = get_test_connection();
        let category = insert_test_category("Sedan", &connection);

        let vehicle = create_vehicle(&test_vehicle_form(category.code, 20_000.0), &connection)
            .unwrap();

        assert!(vehicle.is_visible);
        assert_eq!(get_vehicle(vehicle.code, &connection), Ok(vehicle));
    }

    #[test]
    fn hidden_vehicles_are_not_listed() {
        let connection = get_test_connection();
        let shown = insert_test_vehicle(20_000.0, &connection);
        let hidden = insert_test_vehicle(30_000.0, &connection);

        hide_vehicle(hidden.code, &connection).unwrap();
        let listings = get_visible_vehicles(&connection).unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].vehicle, shown);
        assert_eq!(listings[0].category_name, "Sedan");
    }

    #[test]
    fn filters_by_price_range() {
        let connection = get_test_connection();
        insert_test_vehicle(10_000.0, &connection);
        let middle = insert_test_vehicle(20_000.0, &connection);
        insert_test_vehicle(30_000.0, &connection);

        let listings = get_vehicles_by_price(Some(15_000.0), Some(25_000.0), &connection).unwrap();
        let open_ended = get_vehicles_by_price(Some(15_000.0), None, &connection).unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].vehicle, middle);
        assert_eq!(open_ended.len(), 2);
    }

    #[test]
    fn inverted_price_range_is_rejected() {
        let connection = get_test_connection();

        let result = get_vehicles_by_price(Some(2.0), Some(1.0), &connection);

        assert!(matches!(result, Err(Error::Validation { .. })));
    }

    #[test]
    fn premium_vehicles_are_priced_above_threshold() {
        let connection = get_test_connection();
        insert_test_vehicle(50_000.0, &connection);
        let premium = insert_test_vehicle(80_000.0, &connection);

        let listings = get_premium_vehicles(&connection).unwrap();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].vehicle, premium);
    }

    #[test]
    fn patch_changes_only_given_fields() {
        let connection = get_test_connection();
        let vehicle = insert_test_vehicle(20_000.0, &connection);

        let patched = patch_vehicle(
            vehicle.code,
            VehiclePatch {
                mileage: Some(12_345),
                ..Default::default()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(patched.mileage, 12_345);
        assert_eq!(patched.name, vehicle.name);
        assert_eq!(patched.price, vehicle.price);
    }

    #[test]
    fn patch_cannot_make_vehicle_invalid() {
        let connection = get_test_connection();
        let vehicle = insert_test_vehicle(20_000.0, &connection);

        let result = patch_vehicle(
            vehicle.code,
            VehiclePatch {
                price: Some(-1.0),
                ..Default::default()
            },
            &connection,
        );

        assert!(matches!(
            result,
            Err(Error::Validation { field: "price", .. })
        ));
        assert_eq!(get_vehicle(vehicle.code, &connection), Ok(vehicle));
    }

    #[test]
    fn patch_missing_vehicle_is_not_found() {
        let connection = get_test_connection();

        let result = patch_vehicle(42, VehiclePatch::default(), &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn delete_vehicle_removes_inventory() {
        let connection = get_test_connection();
        let vehicle = insert_test_vehicle(20_000.0, &connection);
        insert_test_inventory(vehicle.code, 3, &connection);

        delete_vehicle(vehicle.code, &connection).unwrap();

        assert_eq!(get_vehicle(vehicle.code, &connection), Err(Error::NotFound));
        assert_eq!(get_stock(vehicle.code, &connection), Err(Error::NotFound));
    }

    #[test]
    fn delete_sold_vehicle_is_in_use_and_keeps_inventory() {
        let connection = get_test_connection();
        let sale = insert_test_sale(&connection);
        let stock_before = get_stock(sale.vehicle_code, &connection).unwrap();

        let result = delete_vehicle(sale.vehicle_code, &connection);

        assert_eq!(result, Err(Error::InUse));
        assert_eq!(get_stock(sale.vehicle_code, &connection), Ok(stock_before));
    }

    #[test]
    fn delete_missing_vehicle_is_not_found() {
        let connection = get_test_connection();

        assert_eq!(delete_vehicle(42, &connection), Err(Error::NotFound));
    }

    #[test]
    fn update_keeps_code() {
        let connection = get_test_connection();
        let vehicle = insert_test_vehicle(20_000.0, &connection);

        let updated = crate::vehicle::update_vehicle(
            vehicle.code,
            &VehicleForm {
                name: "Camry".to_owned(),
                ..test_vehicle_form(vehicle.category_code, 25_000.0)
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.code, vehicle.code);
        assert_eq!(updated.name, "Camry");
        assert_eq!(updated.price, 25_000.0);
    }
}
