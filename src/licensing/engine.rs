use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use tracing::Span;
use uuid::Uuid;

use crate::db::{DbPool, queries};
use crate::error::{AppError, Result};
use crate::id::EntityType;
use crate::models::{
    ActivateLicense, Caller, CheckLicense, CreateLicense, DeleteDeviceResult, Device,
    HistoryStatus, License, LicenseHistory, RenewLicense, User,
};

use super::binding::{
    bind_device, partition_bindings, release_bindings, release_device, resolve_device,
};
use super::dates::{add_days, days_between, format_timestamp, parse_expiration, start_of_day};
use super::history::record_change;
use super::ticket::Ticket;

/// Description stored on licenses created without one.
pub const DEFAULT_DESCRIPTION: &str = "Enjoy our products!";

/// Generate an activation code: 128 random bits as 32 uppercase hex digits.
pub fn generate_activation_code() -> String {
    format!("{:032X}", rand::random::<u128>())
}

/// Outcome of a successful renewal.
#[derive(Debug, Clone, Serialize)]
pub struct Renewal {
    pub ticket: Ticket,
    pub license: License,
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn operation_span(operation: &'static str) -> Span {
    tracing::info_span!("license_op", operation, correlation_id = %Uuid::new_v4())
}

fn require_authenticated(caller: &Caller) -> Result<()> {
    if caller.is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthenticated)
    }
}

fn require_admin(caller: &Caller) -> Result<()> {
    require_authenticated(caller)?;
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("administrator role required".into()))
    }
}

fn caller_user(conn: &Connection, caller: &Caller) -> Result<User> {
    queries::get_user_by_email(conn, &caller.identity)?
        .ok_or_else(|| AppError::NotFound("user".into()))
}

/// A refused renewal and the ticket logged for it, when it warrants one.
#[derive(Debug)]
struct RenewalRefusal {
    ticket: Option<Ticket>,
    error: AppError,
}

impl RenewalRefusal {
    fn ticketed(ticket: Ticket, error: AppError) -> Self {
        Self {
            ticket: Some(ticket),
            error,
        }
    }

    fn into_error(self, operation: &'static str) -> AppError {
        match self.ticket {
            Some(ticket) => ticket.refuse(operation, self.error),
            None => self.error,
        }
    }
}

/// Validate a renewal against the license state. Returns the new ending date.
fn check_renewal(
    license: &License,
    now: i64,
    requested: &str,
) -> std::result::Result<i64, RenewalRefusal> {
    let owner = Some(license.owner_id.as_str());

    if license.blocked {
        return Err(RenewalRefusal::ticketed(
            Ticket::create(owner, true, None),
            AppError::InvalidState("blocked, cannot renew".into()),
        ));
    }
    if license.ending_date < now {
        return Err(RenewalRefusal::ticketed(
            Ticket::create(owner, false, None),
            AppError::InvalidState("expired, cannot renew".into()),
        ));
    }

    let new_ending = parse_expiration(requested).map_err(|error| RenewalRefusal {
        ticket: None,
        error,
    })?;
    if new_ending <= license.ending_date {
        return Err(RenewalRefusal::ticketed(
            Ticket::create(owner, false, None),
            AppError::InvalidArgument("new date must be after current ending date".into()),
        ));
    }

    Ok(new_ending)
}

/// License lifecycle engine.
///
/// Constructed once at startup and shared through `AppState`. Each operation
/// takes one pooled connection for its duration; mutating operations run in a
/// single IMMEDIATE transaction so a refusal leaves no partial writes behind.
#[derive(Clone)]
pub struct LicenseEngine {
    db: DbPool,
}

impl LicenseEngine {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Issue a new license. Admin only.
    pub fn create_license(&self, caller: &Caller, input: &CreateLicense) -> Result<License> {
        let span = operation_span("create_license");
        let _enter = span.enter();

        require_admin(caller)?;

        if input.device_count < 0 {
            return Err(AppError::InvalidArgument(
                "device_count must not be negative".into(),
            ));
        }

        let mut conn = self.db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let product = queries::get_product_by_id(&tx, &input.product_id)?
            .ok_or_else(|| AppError::NotFound("product".into()))?;
        if product.blocked {
            return Err(AppError::InvalidState(format!(
                "product '{}' is blocked",
                product.name
            )));
        }
        let owner = queries::get_user_by_id(&tx, &input.owner_id)?
            .ok_or_else(|| AppError::NotFound("owner".into()))?;
        let license_type = queries::get_license_type_by_id(&tx, &input.license_type_id)?
            .ok_or_else(|| AppError::NotFound("license type".into()))?;

        let now = now();
        let today = start_of_day(now);
        let description = input
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DESCRIPTION);

        let license = License {
            id: EntityType::License.gen_id(),
            code: generate_activation_code(),
            user_id: None,
            owner_id: owner.id.clone(),
            product_id: product.id.clone(),
            license_type_id: license_type.id.clone(),
            first_activation_date: today,
            ending_date: add_days(today, license_type.default_duration),
            blocked: false,
            device_count: input.device_count,
            duration: license_type.default_duration,
            description: description.to_string(),
            created_at: now,
        };

        queries::insert_license(&tx, &license)?;
        record_change(
            &tx,
            &license.id,
            &owner.id,
            HistoryStatus::Created,
            now,
            None,
        )?;
        tx.commit()?;

        tracing::info!(
            license_id = %license.id,
            owner_id = %owner.id,
            product_id = %product.id,
            device_count = license.device_count,
            ending_date = %format_timestamp(license.ending_date),
            "License created"
        );

        Ok(license)
    }

    /// Extend a license's validity window.
    ///
    /// Allowed for administrators and for the license's owner or holder.
    pub fn renew_license(&self, caller: &Caller, input: &RenewLicense) -> Result<Renewal> {
        const OP: &str = "renew_license";
        let span = operation_span(OP);
        let _enter = span.enter();

        require_authenticated(caller)?;

        let mut conn = self.db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let license = queries::get_license_by_code(&tx, &input.code)?
            .ok_or_else(|| AppError::InvalidArgument("invalid license key".into()))?;

        let actor_id = if caller.is_admin() {
            // Admins without a user row are recorded against the owner.
            queries::get_user_by_email(&tx, &caller.identity)?
                .map(|user| user.id)
                .unwrap_or_else(|| license.owner_id.clone())
        } else {
            let user = caller_user(&tx, caller)?;
            if !license.is_held_by(&user.id) {
                return Err(Ticket::create(Some(license.owner_id.as_str()), false, None).refuse(
                    OP,
                    AppError::Forbidden("caller is neither owner nor holder of this license".into()),
                ));
            }
            user.id
        };

        let now = now();
        let new_ending = check_renewal(&license, now, &input.new_expiration_date)
            .map_err(|refusal| refusal.into_error(OP))?;

        let duration = i32::try_from(days_between(now, new_ending))
            .map_err(|_| AppError::InvalidArgument("new expiration date is out of range".into()))?;

        queries::update_license_ending_date(&tx, &license.id, new_ending, duration)?;
        record_change(
            &tx,
            &license.id,
            &actor_id,
            HistoryStatus::Renewed,
            now,
            Some(&format!("Valid until {}", format_timestamp(new_ending))),
        )?;

        let binding = queries::get_binding_for_license(&tx, &license.id)?;
        tx.commit()?;

        let mut ticket = Ticket::create(Some(license.owner_id.as_str()), false, Some(new_ending))
            .with_lifetime(i64::from(duration));
        match &binding {
            Some(binding) => {
                ticket = ticket.with_device(&binding.device_id, binding.activation_date);
            }
            None => {
                tracing::info!(license_id = %license.id, "License not yet activated on a device");
            }
        }
        ticket.log_issued(OP);

        let license = License {
            ending_date: new_ending,
            duration,
            ..license
        };

        Ok(Renewal { ticket, license })
    }

    /// Report the license bound to a device. Read-only.
    pub fn check_license(&self, caller: &Caller, input: &CheckLicense) -> Result<Ticket> {
        const OP: &str = "check_license";
        let span = operation_span(OP);
        let _enter = span.enter();

        require_authenticated(caller)?;

        let conn = self.db.get()?;

        let device =
            queries::get_device_by_mac_and_name(&conn, &input.mac_address, &input.device_name)?
                .ok_or_else(|| AppError::NotFound("device".into()))?;
        let binding = queries::get_binding_for_device(&conn, &device.id)?
            .ok_or_else(|| AppError::NotFound("no active license for device".into()))?;

        let ticket = match queries::get_license_by_id(&conn, &binding.license_id)? {
            Some(license) => Ticket::create(
                license.user_id.as_deref(),
                license.blocked,
                Some(license.ending_date),
            )
            .with_device(&device.id, binding.activation_date)
            .with_lifetime(days_between(now(), license.ending_date)),
            None => {
                tracing::warn!(
                    binding_id = %binding.id,
                    license_id = %binding.license_id,
                    "Device bound to a missing license"
                );
                Ticket::create(None, true, None).with_device(&device.id, binding.activation_date)
            }
        };
        ticket.log_issued(OP);

        Ok(ticket)
    }

    /// Bind a device to a license by activation code, consuming one slot.
    ///
    /// Binds the caller as holder on first activation. Any refusal rolls back
    /// the holder binding and device registration done earlier in the call.
    pub fn activate_license(&self, caller: &Caller, input: &ActivateLicense) -> Result<Ticket> {
        const OP: &str = "activate_license";
        let span = operation_span(OP);
        let _enter = span.enter();

        let ticket = self
            .activate(caller, input)
            .map_err(|e| Ticket::create(None, true, None).refuse(OP, e))?;
        ticket.log_issued(OP);

        Ok(ticket)
    }

    fn activate(&self, caller: &Caller, input: &ActivateLicense) -> Result<Ticket> {
        require_authenticated(caller)?;

        let mut conn = self.db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let license = queries::get_license_by_code(&tx, &input.code)?
            .ok_or_else(|| AppError::InvalidArgument("license not found".into()))?;
        let user = caller_user(&tx, caller)?;

        match license.user_id.as_deref() {
            Some(holder) if holder != user.id => {
                return Err(AppError::InvalidArgument("ownership mismatch".into()));
            }
            Some(_) => {}
            None => {
                queries::set_license_holder_if_unset(&tx, &license.id, &user.id)?;
            }
        }

        let now = now();
        if license.blocked {
            return Err(AppError::InvalidState("license is blocked".into()));
        }
        if license.ending_date < now {
            return Err(AppError::InvalidState("license expired".into()));
        }

        let device = resolve_device(&tx, &input.mac_address, &input.device_name, &user.id)?;
        let binding = bind_device(&tx, &device, &license, now)?;
        record_change(
            &tx,
            &license.id,
            &user.id,
            HistoryStatus::Activated,
            now,
            None,
        )?;
        tx.commit()?;

        Ok(
            Ticket::create(Some(user.id.as_str()), false, Some(license.ending_date))
                .with_device(&device.id, binding.activation_date)
                .with_lifetime(days_between(now, license.ending_date)),
        )
    }

    /// Delete a device, returning its slots to the licenses it was bound to.
    ///
    /// Administrators remove the device and every binding. Other users release
    /// the bindings of licenses they own or hold; the registrant also removes
    /// the device once no other user's license is bound to it.
    pub fn delete_device(&self, caller: &Caller, device_id: &str) -> Result<DeleteDeviceResult> {
        let span = operation_span("delete_device");
        let _enter = span.enter();

        require_authenticated(caller)?;

        let mut conn = self.db.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let device = queries::get_device_by_id(&tx, device_id)?
            .ok_or_else(|| AppError::NotFound("device".into()))?;

        let now = now();
        let result = if caller.is_admin() {
            let actor_id = match queries::get_user_by_email(&tx, &caller.identity)? {
                Some(user) => user.id,
                None => device.user_id.clone(),
            };
            release_device(&tx, &device, &actor_id, now)?
        } else {
            let user = caller_user(&tx, caller)?;
            let bindings = partition_bindings(&tx, &device, &user.id)?;

            if bindings.foreign.is_empty() && user.id == device.user_id {
                release_device(&tx, &device, &user.id, now)?
            } else if !bindings.own.is_empty() {
                // Other users' licenses keep the device registered.
                DeleteDeviceResult {
                    deleted: false,
                    released: release_bindings(&tx, &bindings.own, &user.id, now)?,
                }
            } else if user.id == device.user_id {
                return Err(AppError::Forbidden(
                    "device is bound to licenses of other users".into(),
                ));
            } else {
                return Err(AppError::Forbidden(
                    "caller neither registered this device nor holds a license bound to it".into(),
                ));
            }
        };
        tx.commit()?;

        tracing::info!(
            device_id = %device.id,
            deleted = result.deleted,
            released = result.released.len(),
            "Device released"
        );

        Ok(result)
    }

    /// Devices registered by the caller.
    pub fn list_devices(&self, caller: &Caller) -> Result<Vec<Device>> {
        require_authenticated(caller)?;

        let conn = self.db.get()?;
        let user = caller_user(&conn, caller)?;
        queries::list_devices_for_user(&conn, &user.id)
    }

    /// Audit trail of a license, newest first.
    ///
    /// Allowed for administrators and for the license's owner or holder.
    pub fn license_history(&self, caller: &Caller, license_id: &str) -> Result<Vec<LicenseHistory>> {
        require_authenticated(caller)?;

        let conn = self.db.get()?;
        let license = queries::get_license_by_id(&conn, license_id)?
            .ok_or_else(|| AppError::NotFound("license".into()))?;

        if !caller.is_admin() {
            let user = caller_user(&conn, caller)?;
            if !license.is_held_by(&user.id) {
                return Err(AppError::Forbidden(
                    "caller is neither owner nor holder of this license".into(),
                ));
            }
        }

        queries::list_license_history(&conn, &license.id)
    }
}
