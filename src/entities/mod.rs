pub mod department;
pub mod doctor;
pub mod hospital;
pub mod hospital_department;
pub mod reservation;
pub mod user;
