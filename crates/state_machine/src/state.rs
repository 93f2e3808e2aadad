/// Состояние оркестратора детекции
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DetectorState {
    /// Активного уровня нет
    Idle,
    /// Держим один активный уровень
    Active,
}
